use std::fmt;
use std::sync::Arc;

/// A single named check on a value.
pub struct ValidationRule<T> {
    predicate: Arc<dyn Fn(&T) -> bool + Send + Sync>,
    message: String,
}

impl<T> ValidationRule<T> {
    pub fn new<F>(predicate: F, message: impl Into<String>) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            message: message.into(),
        }
    }

    pub fn check(&self, value: &T) -> bool {
        (self.predicate)(value)
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl<T> Clone for ValidationRule<T> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
            message: self.message.clone(),
        }
    }
}

/// Outcome of running a [`Validator`]: one message per failed rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.errors.join("; "))
    }
}

/// Ordered set of rules. Every rule runs; failures are collected.
pub struct Validator<T> {
    rules: Vec<ValidationRule<T>>,
}

impl<T> Validator<T> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn add_rule(&mut self, rule: ValidationRule<T>) {
        self.rules.push(rule);
    }

    /// Builder form of [`add_rule`](Self::add_rule).
    pub fn rule<F>(mut self, predicate: F, message: impl Into<String>) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.rules.push(ValidationRule::new(predicate, message));
        self
    }

    pub fn validate(&self, value: &T) -> ValidationResult {
        ValidationResult {
            errors: self
                .rules
                .iter()
                .filter(|rule| !rule.check(value))
                .map(|rule| rule.message.clone())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<T> Default for Validator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Validator<T> {
    fn clone(&self) -> Self {
        Self {
            rules: self.rules.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_every_failed_rule() {
        let validator = Validator::new()
            .rule(|v: &i32| *v >= 0, "must not be negative")
            .rule(|v: &i32| *v <= 100, "must not exceed 100")
            .rule(|v: &i32| v % 2 == 0, "must be even");

        assert!(validator.validate(&42).is_valid());

        let result = validator.validate(&101);
        assert_eq!(result.errors, vec!["must not exceed 100", "must be even"]);
        assert_eq!(result.to_string(), "must not exceed 100; must be even");
    }

    #[test]
    fn empty_validator_accepts_everything() {
        let validator: Validator<String> = Validator::default();
        assert!(validator.is_empty());
        assert!(validator.validate(&String::new()).is_valid());
    }
}
