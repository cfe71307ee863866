/// Sequential id generator: `{prefix}{n}` starting at 1
///
/// Each filter owns its generators; nested filters get their own and the
/// parent re-homes the ids they produce.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    prefix: String,
    counter: u64,
}

impl IdGenerator {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            counter: 0,
        }
    }

    pub fn create_id(&mut self) -> String {
        self.counter += 1;
        self.last_id()
    }

    /// Last id created (`{prefix}0` before the first one)
    pub fn last_id(&self) -> String {
        format!("{}{}", self.prefix, self.counter)
    }

    pub fn count(&self) -> u64 {
        self.counter
    }

    pub fn reset(&mut self) {
        self.counter = 0;
    }
}
