use lnn_ast::{TypeName, TypeVariableName};
use lnn_collections::{MutMap, VecMap};
use lnn_error_macros::internal_error;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlgebraicTypeId(u32);

impl AlgebraicTypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The type of a lambda term.
///
/// Types are immutable trees; substitution builds a new tree. Algebraic types are referred to by
/// id into [AlgebraicTypes], never owned.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    /// Unresolved. Must be bound or generalized by the end of inference.
    Variable(TypeVariableName),
    /// An algebraic type applied to exactly as many arguments as it has parameters.
    Application(AlgebraicTypeId, Vec<Type>),
    Function(Box<Type>, Box<Type>),
}

impl Type {
    pub fn variable(name: impl Into<String>) -> Self {
        Type::Variable(name.into())
    }

    pub fn function(from: Type, to: Type) -> Self {
        Type::Function(Box::new(from), Box::new(to))
    }

    /// `a1 -> a2 -> ... -> result`
    pub fn arrows<I>(arguments: I, result: Type) -> Self
    where
        I: IntoIterator<Item = Type>,
        I::IntoIter: DoubleEndedIterator,
    {
        arguments
            .into_iter()
            .rev()
            .fold(result, |to, from| Type::function(from, to))
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Type::Function(..))
    }

    /// The argument types of a curried arrow chain, outermost first.
    pub fn arguments(&self) -> Vec<&Type> {
        let mut arguments = Vec::new();
        let mut current = self;

        while let Type::Function(from, to) = current {
            arguments.push(from.as_ref());
            current = to;
        }

        arguments
    }

    /// What is left after every argument of the arrow chain is supplied.
    pub fn result(&self) -> &Type {
        let mut current = self;

        while let Type::Function(_, to) = current {
            current = to;
        }

        current
    }

    /// Drops the first `count` arguments of an arrow chain.
    pub fn drop_arguments(&self, count: usize) -> &Type {
        let mut current = self;

        for _ in 0..count {
            match current {
                Type::Function(_, to) => current = to,
                _ => internal_error!("dropped more arguments than the arrow chain has"),
            }
        }

        current
    }

    /// Type variables in order of first occurrence, without duplicates.
    pub fn free_variables(&self) -> Vec<&str> {
        let mut buffer = Vec::new();
        self.collect_variables(&mut buffer);
        buffer
    }

    fn collect_variables<'a>(&'a self, buffer: &mut Vec<&'a str>) {
        match self {
            Type::Variable(name) => {
                if !buffer.contains(&name.as_str()) {
                    buffer.push(name);
                }
            }
            Type::Application(_, arguments) => {
                for arg in arguments {
                    arg.collect_variables(buffer);
                }
            }
            Type::Function(from, to) => {
                from.collect_variables(buffer);
                to.collect_variables(buffer);
            }
        }
    }

    /// A type is instantiated when it mentions no type variables.
    pub fn is_instantiated(&self) -> bool {
        match self {
            Type::Variable(_) => false,
            Type::Application(_, arguments) => arguments.iter().all(Type::is_instantiated),
            Type::Function(from, to) => from.is_instantiated() && to.is_instantiated(),
        }
    }

    pub fn substitute(&self, bindings: &VecMap<TypeVariableName, Type>) -> Type {
        if bindings.is_empty() {
            return self.clone();
        }

        self.map_variables(&|name| {
            bindings
                .iter()
                .find(|(variable, _)| variable.as_str() == name)
                .map(|(_, ty)| ty.clone())
        })
    }

    /// Rebuilds the type, replacing each variable for which `replace` answers.
    pub fn map_variables<F>(&self, replace: &F) -> Type
    where
        F: Fn(&str) -> Option<Type>,
    {
        match self {
            Type::Variable(name) => replace(name).unwrap_or_else(|| self.clone()),
            Type::Application(id, arguments) => Type::Application(
                *id,
                arguments
                    .iter()
                    .map(|arg| arg.map_variables(replace))
                    .collect(),
            ),
            Type::Function(from, to) => {
                Type::function(from.map_variables(replace), to.map_variables(replace))
            }
        }
    }
}

/// A type scheme: `ty` with `parameters` universally quantified.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Parametrised {
    pub parameters: Vec<TypeVariableName>,
    pub ty: Type,
}

impl Parametrised {
    pub fn monomorphic(ty: Type) -> Self {
        Self {
            parameters: Vec::new(),
            ty,
        }
    }

    /// Quantifies over every variable of `ty`, in order of first occurrence.
    pub fn generalize(ty: Type) -> Self {
        let parameters = ty
            .free_variables()
            .into_iter()
            .map(str::to_string)
            .collect();

        Self { parameters, ty }
    }

    pub fn is_polymorphic(&self) -> bool {
        !self.parameters.is_empty()
    }

    pub fn instantiate(&self, arguments: &[Type]) -> Type {
        debug_assert_eq!(self.parameters.len(), arguments.len());

        self.ty.substitute(&self.bindings(arguments))
    }

    pub fn bindings(&self, arguments: &[Type]) -> VecMap<TypeVariableName, Type> {
        self.parameters
            .iter()
            .cloned()
            .zip(arguments.iter().cloned())
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SumOperand {
    Object(TypeName),
    Product(TypeName, Vec<Type>),
}

impl SumOperand {
    pub fn name(&self) -> &str {
        match self {
            SumOperand::Object(name) | SumOperand::Product(name, _) => name,
        }
    }

    pub fn arguments(&self) -> &[Type] {
        match self {
            SumOperand::Object(_) => &[],
            SumOperand::Product(_, arguments) => arguments,
        }
    }
}

/// A user-defined sum of products.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlgebraicType {
    pub name: TypeName,
    pub parameters: Vec<TypeVariableName>,
    /// Operands in declaration order. Argument types are written over `parameters`.
    pub structure: Vec<SumOperand>,
    /// Constructor name to its full type: an arrow chain ending in this type applied to its
    /// parameters, or just that application for objects.
    pub constructors: VecMap<TypeName, Type>,
}

impl AlgebraicType {
    pub fn constructor_scheme(&self, constructor: &str) -> Option<Parametrised> {
        let (_, ty) = self
            .constructors
            .iter()
            .find(|(name, _)| name.as_str() == constructor)?;

        Some(Parametrised {
            parameters: self.parameters.clone(),
            ty: ty.clone(),
        })
    }

    /// The operand declaring `constructor`, with its position in the structure.
    pub fn operand(&self, constructor: &str) -> Option<(usize, &SumOperand)> {
        self.structure
            .iter()
            .enumerate()
            .find(|(_, operand)| operand.name() == constructor)
    }

    /// The structure with the type parameters bound to `arguments`.
    pub fn instantiate_structure(&self, arguments: &[Type]) -> Vec<SumOperand> {
        let bindings: VecMap<_, _> = self
            .parameters
            .iter()
            .cloned()
            .zip(arguments.iter().cloned())
            .collect();

        self.structure
            .iter()
            .map(|operand| match operand {
                SumOperand::Object(name) => SumOperand::Object(name.clone()),
                SumOperand::Product(name, operands) => SumOperand::Product(
                    name.clone(),
                    operands.iter().map(|ty| ty.substitute(&bindings)).collect(),
                ),
            })
            .collect()
    }
}

/// Arena of every algebraic type of the program, in definition order.
#[derive(Clone, Debug, Default)]
pub struct AlgebraicTypes {
    types: Vec<AlgebraicType>,
    by_name: MutMap<TypeName, AlgebraicTypeId>,
    constructors: MutMap<TypeName, AlgebraicTypeId>,
}

impl AlgebraicTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registers a type with an empty structure so that its own operands can refer to it.
    pub fn reserve(&mut self, name: TypeName, parameters: Vec<TypeVariableName>) -> AlgebraicTypeId {
        let id = AlgebraicTypeId(self.types.len() as u32);

        self.by_name.insert(name.clone(), id);
        self.types.push(AlgebraicType {
            name,
            parameters,
            structure: Vec::new(),
            constructors: VecMap::default(),
        });

        id
    }

    pub fn define(
        &mut self,
        id: AlgebraicTypeId,
        structure: Vec<SumOperand>,
        constructors: VecMap<TypeName, Type>,
    ) {
        for name in constructors.keys() {
            self.constructors.insert(name.clone(), id);
        }

        let algebraic = &mut self.types[id.index()];
        algebraic.structure = structure;
        algebraic.constructors = constructors;
    }

    pub fn get(&self, id: AlgebraicTypeId) -> &AlgebraicType {
        &self.types[id.index()]
    }

    pub fn lookup(&self, name: &str) -> Option<AlgebraicTypeId> {
        self.by_name.get(name).copied()
    }

    /// The type that declares `constructor`.
    pub fn lookup_constructor(&self, constructor: &str) -> Option<AlgebraicTypeId> {
        self.constructors.get(constructor).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AlgebraicTypeId, &AlgebraicType)> {
        self.types
            .iter()
            .enumerate()
            .map(|(index, ty)| (AlgebraicTypeId(index as u32), ty))
    }

    /// `Application` of the named type with no arguments, for tests and callers that name
    /// monomorphic types directly.
    pub fn named(&self, name: &str) -> Option<Type> {
        self.lookup(name).map(|id| Type::Application(id, Vec::new()))
    }

    pub fn display<'a>(&'a self, ty: &'a Type) -> TypeDisplay<'a> {
        TypeDisplay { ty, types: self }
    }
}

pub struct TypeDisplay<'a> {
    ty: &'a Type,
    types: &'a AlgebraicTypes,
}

impl TypeDisplay<'_> {
    fn write(&self, f: &mut fmt::Formatter<'_>, ty: &Type, parens: bool) -> fmt::Result {
        match ty {
            Type::Variable(name) => write!(f, "{name}"),
            Type::Application(id, arguments) => {
                let name = &self.types.get(*id).name;
                if arguments.is_empty() {
                    return write!(f, "{name}");
                }

                if parens {
                    write!(f, "(")?;
                }
                write!(f, "{name}")?;
                for arg in arguments {
                    write!(f, " ")?;
                    self.write(f, arg, true)?;
                }
                if parens {
                    write!(f, ")")?;
                }

                Ok(())
            }
            Type::Function(from, to) => {
                if parens {
                    write!(f, "(")?;
                }
                self.write(f, from, true)?;
                write!(f, " -> ")?;
                self.write(f, to, false)?;
                if parens {
                    write!(f, ")")?;
                }

                Ok(())
            }
        }
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, self.ty, false)
    }
}
