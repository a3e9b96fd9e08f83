use lnn_collections::MutMap;
use lnn_types::{InstanceName, InstanceSignature, TypeSignature};

#[derive(Debug)]
struct Entry<T> {
    by_type: MutMap<TypeSignature, usize>,
    history: Vec<(TypeSignature, T)>,
}

impl<T> Default for Entry<T> {
    fn default() -> Self {
        Self {
            by_type: MutMap::default(),
            history: Vec::new(),
        }
    }
}

/// Values keyed by a definition's signature and then by the type signature it is instantiated
/// at. An entry is never overwritten, and every signature remembers the order in which its
/// instances were added.
#[derive(Debug)]
pub struct Instances<T> {
    entries: MutMap<InstanceSignature, Entry<T>>,
    signatures: Vec<InstanceSignature>,
}

impl<T> Default for Instances<T> {
    fn default() -> Self {
        Self {
            entries: MutMap::default(),
            signatures: Vec::new(),
        }
    }
}

impl<T> Instances<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, signature: &[String], type_signature: &TypeSignature) -> Option<&T> {
        let entry = self.entries.get(signature)?;
        let index = entry.by_type.get(type_signature)?;

        Some(&entry.history[*index].1)
    }

    pub fn get_by_name(&self, name: &InstanceName) -> Option<&T> {
        self.get(&name.signature, &name.type_signature)
    }

    pub fn contains(&self, signature: &[String], type_signature: &TypeSignature) -> bool {
        self.get(signature, type_signature).is_some()
    }

    /// Stores `value` unless the pair already has one. Either way returns what is stored.
    pub fn put_if_absent(
        &mut self,
        signature: InstanceSignature,
        type_signature: TypeSignature,
        value: T,
    ) -> &T {
        if !self.entries.contains_key(&signature) {
            self.signatures.push(signature.clone());
        }

        let entry = self.entries.entry(signature).or_default();
        let index = match entry.by_type.get(&type_signature) {
            Some(index) => *index,
            None => {
                let index = entry.history.len();
                entry.by_type.insert(type_signature.clone(), index);
                entry.history.push((type_signature, value));
                index
            }
        };

        &entry.history[index].1
    }

    /// Every instance of `signature`, oldest first.
    pub fn get_instances(
        &self,
        signature: &[String],
    ) -> impl Iterator<Item = (&TypeSignature, &T)> {
        self.entries
            .get(signature)
            .into_iter()
            .flat_map(|entry| entry.history.iter().map(|(sig, value)| (sig, value)))
    }

    /// Signatures in the order they first got an instance.
    pub fn signatures(&self) -> impl Iterator<Item = &InstanceSignature> {
        self.signatures.iter()
    }

    /// All instances, grouped by signature in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (InstanceName, &T)> {
        self.signatures.iter().flat_map(move |signature| {
            self.get_instances(signature).map(move |(type_signature, value)| {
                (
                    InstanceName::new(signature.clone(), type_signature.clone()),
                    value,
                )
            })
        })
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(|entry| entry.history.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use lnn_types::TypeSig;
    use pretty_assertions::assert_eq;

    fn sig(names: &[&str]) -> InstanceSignature {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn types(names: &[&str]) -> TypeSignature {
        names
            .iter()
            .map(|name| TypeSig::Application(InstanceName::new(vec![name.to_string()], vec![])))
            .collect()
    }

    #[test]
    fn put_if_absent_never_overwrites() {
        let mut instances = Instances::new();

        assert_eq!(*instances.put_if_absent(sig(&["id"]), types(&["Bool"]), 1), 1);
        assert_eq!(*instances.put_if_absent(sig(&["id"]), types(&["Bool"]), 2), 1);
        assert_eq!(instances.get(&sig(&["id"]), &types(&["Bool"])), Some(&1));
        assert_eq!(instances.len(), 1);
    }

    #[test]
    fn history_keeps_insertion_order() {
        let mut instances = Instances::new();
        instances.put_if_absent(sig(&["id"]), types(&["Pair"]), "pair");
        instances.put_if_absent(sig(&["f", "g"]), types(&[]), "g");
        instances.put_if_absent(sig(&["id"]), types(&["Bool"]), "bool");

        let history: Vec<_> = instances
            .get_instances(&sig(&["id"]))
            .map(|(_, value)| *value)
            .collect();
        assert_eq!(history, vec!["pair", "bool"]);

        let names: Vec<_> = instances.iter().map(|(name, _)| name.to_string()).collect();
        assert_eq!(names, vec!["(id Pair)", "(id Bool)", "f.g"]);

        assert!(instances.contains(&sig(&["f", "g"]), &vec![]));
        assert_eq!(instances.get_instances(&sig(&["missing"])).count(), 0);
    }
}
