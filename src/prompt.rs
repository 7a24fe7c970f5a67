//! Prompt composition.

/// Instruction used when none is configured.
pub const DEFAULT_INSTRUCTION: &str = "Analyze the uploaded file";

/// Action label used when the caller does not name one.
pub const DEFAULT_ACTION: &str = "Analyze Vibe";

/// Formats the user inputs into the prompt text sent alongside the image.
///
/// Pure interpolation: the inputs are substituted as-is, no trimming or
/// branching on their content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptComposer {
    instruction: String,
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self::new(DEFAULT_INSTRUCTION)
    }
}

impl PromptComposer {
    /// Creates a composer with a custom analysis instruction.
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
        }
    }

    /// Returns the analysis instruction.
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Composes the prompt for one request.
    pub fn compose(&self, target_vibe: &str, action: &str) -> String {
        format!(
            "{}. Target Vibe: {}. Action Triggered: {}",
            self.instruction, target_vibe, action
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_default() {
        let prompt = PromptComposer::default().compose("Industrial Luxury", "Analyze Vibe");
        assert_eq!(
            prompt,
            "Analyze the uploaded file. Target Vibe: Industrial Luxury. Action Triggered: Analyze Vibe"
        );
    }

    #[test]
    fn test_compose_is_deterministic() {
        let composer = PromptComposer::new("Critique the moodboard");
        let a = composer.compose("Retro Futurism", "Suggest Palette");
        let b = composer.compose("Retro Futurism", "Suggest Palette");
        assert_eq!(a, b);
        assert_eq!(
            a,
            "Critique the moodboard. Target Vibe: Retro Futurism. Action Triggered: Suggest Palette"
        );
    }

    #[test]
    fn test_compose_substitutes_verbatim() {
        let prompt = PromptComposer::default().compose("  cozy. {brutalist}  ", "");
        assert_eq!(
            prompt,
            "Analyze the uploaded file. Target Vibe:   cozy. {brutalist}  . Action Triggered: "
        );
    }
}
