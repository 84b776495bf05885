// Persona prompt template rendered with Tera
//
// The template is static text with a single interpolation point, `problem`.
// The problem is inserted verbatim (autoescape off): the target is a
// free-text prompt, not HTML.

use serde::Serialize;
use tera::{Context, Tera};

/// Name under which the persona template is registered
pub const PERSONA_TEMPLATE_NAME: &str = "bhai_persona";

/// The "bhai" persona instruction with the user's problem appended
pub const PERSONA_TEMPLATE: &str = "Bro I am tired of prompting again and again. Listen, you have to be bakchod ekdum andha wala, but keep your advices mature, kuch bhi nahi bolna hai, keep it crisp! achhe se baat kar.But keep it savage. Also dont force comedy and humour, keep it real. Use pop and meme references. Give very crisp advices and be raw.use Hinglish in banarasi accent. Dont over use anything, I need it very normal and funny, also advice should be in 150 words max. Be savage and funny. Dont sound like forced reference talker. Dont use symbols in text like *

   Problem: {{ problem }}

";

#[derive(Serialize)]
struct PromptContext<'a> {
    problem: &'a str,
}

/// Compiled persona prompt
pub struct PersonaPrompt {
    tera: Tera,
}

impl PersonaPrompt {
    /// Compile the built-in persona template
    pub fn new() -> Result<Self, String> {
        Self::from_template(PERSONA_TEMPLATE)
    }

    /// Compile a custom template; it must reference `problem`
    pub fn from_template(template: &str) -> Result<Self, String> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_template(PERSONA_TEMPLATE_NAME, template)
            .map_err(|e| format!("Invalid prompt template: {}", e))?;
        Ok(Self { tera })
    }

    /// Substitute the problem text into the template
    pub fn render(&self, problem: &str) -> Result<String, String> {
        let context = Context::from_serialize(PromptContext { problem })
            .map_err(|e| format!("Failed to build prompt context: {}", e))?;

        self.tera
            .render(PERSONA_TEMPLATE_NAME, &context)
            .map_err(|e| format!("Failed to render prompt: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_embeds_problem_verbatim() {
        let prompt = PersonaPrompt::new().unwrap();
        let rendered = prompt.render("mera dost paisa nahi de raha").unwrap();

        assert!(rendered.starts_with("Bro I am tired of prompting"));
        assert!(rendered.contains("   Problem: mera dost paisa nahi de raha\n"));
    }

    #[test]
    fn test_render_does_not_escape_markup() {
        let prompt = PersonaPrompt::new().unwrap();
        let rendered = prompt.render("boss said <\"no\"> & left").unwrap();

        assert!(rendered.contains("boss said <\"no\"> & left"));
    }

    #[test]
    fn test_render_keeps_template_syntax_in_problem_literal() {
        let prompt = PersonaPrompt::new().unwrap();
        let rendered = prompt.render("what is {{ 1 + 1 }}?").unwrap();

        assert!(rendered.contains("what is {{ 1 + 1 }}?"));
    }

    #[test]
    fn test_invalid_template_is_rejected() {
        let result = PersonaPrompt::from_template("Problem: {{ problem ");
        assert!(result.is_err());
    }

    #[test]
    fn test_template_with_unknown_variable_fails_to_render() {
        let prompt = PersonaPrompt::from_template("{{ missing }}").unwrap();
        assert!(prompt.render("x").is_err());
    }
}
