use lnn_collections::MutMap;

/// Hands out fresh type variable names.
///
/// Generated names start with a `.`, which no declared name can, so they never capture a
/// user-written variable. Each top-level definition gets its own generator.
#[derive(Debug, Default)]
pub struct NameGenerator {
    counters: MutMap<String, u32>,
}

impl NameGenerator {
    pub const PREFIX: char = '.';

    pub fn new() -> Self {
        Self::default()
    }

    /// `.{hint}{n}`, counting separately per hint.
    pub fn fresh(&mut self, hint: &str) -> String {
        let counter = self.counters.entry(hint.to_string()).or_insert(0);
        let name = format!("{}{hint}{counter}", Self::PREFIX);
        *counter += 1;

        name
    }

    pub fn is_generated(name: &str) -> bool {
        name.starts_with(Self::PREFIX)
    }
}

#[cfg(test)]
mod test {
    use super::NameGenerator;

    #[test]
    fn counters_are_per_hint() {
        let mut names = NameGenerator::new();

        assert_eq!(names.fresh("t"), ".t0");
        assert_eq!(names.fresh("t"), ".t1");
        assert_eq!(names.fresh("r"), ".r0");
        assert!(NameGenerator::is_generated(".r0"));
        assert!(!NameGenerator::is_generated("a"));
    }
}
