//! Behavioral preamble sent as the system instruction of every request.

use serde::{Deserialize, Serialize};

/// Fixed instructions that steer the model's persona and output structure.
///
/// Any field may be overridden from the `[preamble]` table of the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preamble {
    /// Persona the model adopts.
    pub role: String,
    /// Workflow track the persona operates in.
    pub track: String,
    /// Ordered process/output directives, one per line.
    pub directives: Vec<String>,
}

impl Default for Preamble {
    fn default() -> Self {
        Self {
            role: "OMNI-VIBE Autonomous Creative Director".into(),
            track: "Marathon Agent & Creative Autopilot".into(),
            directives: vec![
                "Study the uploaded image: composition, palette, materials, lighting and typography.".into(),
                "Compare what you see against the Target Vibe and name every gap.".into(),
                "Carry out the Action Triggered and nothing else.".into(),
                "Propose concrete, prioritized changes that move the work toward the Target Vibe.".into(),
                "Answer in Markdown with headings, short paragraphs and bullet lists.".into(),
            ],
        }
    }
}

impl Preamble {
    /// Renders the preamble into system instruction text.
    pub fn render(&self) -> String {
        let mut out = format!("# ROLE: {}\n# TRACK: {}\n", self.role, self.track);
        if !self.directives.is_empty() {
            out.push('\n');
            for directive in &self.directives {
                out.push_str("- ");
                out.push_str(directive);
                out.push('\n');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_default() {
        let text = Preamble::default().render();
        assert!(text.starts_with(
            "# ROLE: OMNI-VIBE Autonomous Creative Director\n# TRACK: Marathon Agent & Creative Autopilot\n"
        ));
        assert!(text.contains("- Answer in Markdown"));
    }

    #[test]
    fn test_render_without_directives() {
        let preamble = Preamble {
            role: "Critic".into(),
            track: "Review".into(),
            directives: vec![],
        };
        assert_eq!(preamble.render(), "# ROLE: Critic\n# TRACK: Review\n");
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let preamble: Preamble = toml::from_str(r#"role = "Set Designer""#).unwrap();
        assert_eq!(preamble.role, "Set Designer");
        assert_eq!(preamble.track, Preamble::default().track);
        assert_eq!(preamble.directives, Preamble::default().directives);
    }
}
