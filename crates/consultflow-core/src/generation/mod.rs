//! Text generation boundary.
//!
//! Every generation call in the crate goes through [`dispatch`], which renders a
//! [`PromptRequest`] with its template and fixed temperature and hands the prompt
//! to a [`TextGenerator`]. The pipeline and the research aggregator only ever see
//! the trait, so tests substitute scripted generators.

mod http;
mod prompt;

use tracing::debug;

use crate::error::{ConsultError, Result};

pub use http::HttpTextGenerator;
pub use prompt::{PromptRequest, PromptTemplate};

pub trait TextGenerator: Send + Sync {
    /// Returns the trimmed completion for `prompt`.
    fn generate(&self, prompt: &str, temperature: f32) -> Result<String>;
}

impl<T: TextGenerator + ?Sized> TextGenerator for &T {
    fn generate(&self, prompt: &str, temperature: f32) -> Result<String> {
        (**self).generate(prompt, temperature)
    }
}

impl<T: TextGenerator + ?Sized> TextGenerator for Box<T> {
    fn generate(&self, prompt: &str, temperature: f32) -> Result<String> {
        (**self).generate(prompt, temperature)
    }
}

pub fn dispatch(generator: &dyn TextGenerator, request: &PromptRequest<'_>) -> Result<String> {
    let prompt = request.render();
    let template = request.template();
    debug!(
        template = template.as_str(),
        prompt_chars = prompt.chars().count(),
        temperature = f64::from(template.temperature()),
        "dispatching generation"
    );
    generator.generate(&prompt, template.temperature())
}

pub fn validate_temperature(temperature: f32) -> Result<()> {
    if (0.0..=1.0).contains(&temperature) {
        Ok(())
    } else {
        Err(ConsultError::Validation(format!(
            "temperature must be within [0, 1], got {temperature}"
        )))
    }
}
