/// Controls which optional checks a [`Validator`](crate::Validator) runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// When true, unprefixed unknown fields in permissive versions produce
    /// warnings. They are errors under strict contracts regardless.
    pub lint_unknown_fields: bool,
    /// When true, missing recommended fields produce warnings.
    pub advisories: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            lint_unknown_fields: false,
            advisories: true,
        }
    }
}
