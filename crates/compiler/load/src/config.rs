use lnn_ast::LambdaName;

/// Which definitions are instantiated while loading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Roots {
    /// Every definition whose type has no parameters.
    Monomorphic,
    /// Only these, each of which must be monomorphic.
    Named(Vec<LambdaName>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadConfig {
    pub roots: Roots,
    /// Walk every instance after lowering and fail on inconsistencies. Also turned on by
    /// `LNN_CHECK_SPECS` in debug builds.
    pub check_specs: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            roots: Roots::Monomorphic,
            check_specs: false,
        }
    }
}

impl LoadConfig {
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<LambdaName>,
    {
        Self {
            roots: Roots::Named(names.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn checked(self) -> Self {
        Self {
            check_specs: true,
            ..self
        }
    }
}
