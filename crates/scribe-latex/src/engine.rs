//! Template engine
//!
//! Templates are Jinja templates rendered by minijinja with delimiters that
//! stay out of LaTeX's way. Values go through the configured [`Tags`]
//! (`<< title >>` by default); statements and comments use fixed
//! delimiters:
//!
//! ```text
//! <% if abstract %>
//! \begin{abstract}
//! << abstract >>
//! \end{abstract}
//! <% endif %>
//! <# comment #>
//! ```
//!
//! Output escaping is off: render data is already LaTeX. `none` and
//! undefined values print as nothing, even through a dotted chain such as
//! `<< author.affiliation.name >>`, and a statement alone on its line
//! takes the line with it.

use minijinja::syntax::SyntaxConfig;
use minijinja::{AutoEscape, Environment, Output, State, UndefinedBehavior, Value};
use serde::Serialize;

use crate::config::Tags;
use crate::error::{LatexError, Result};

/// Statement delimiters
pub const BLOCK_TAGS: (&str, &str) = ("<%", "%>");

/// Comment delimiters
pub const COMMENT_TAGS: (&str, &str) = ("<#", "#>");

const TEMPLATE_NAME: &str = "template.tex";

/// A parsed template
#[derive(Debug)]
pub struct Template {
    env: Environment<'static>,
}

impl Template {
    /// Parse `source` using `tags` as value delimiters
    pub fn parse(source: &str, tags: &Tags) -> Result<Self> {
        let mut env = environment(tags)?;
        env.add_template_owned(TEMPLATE_NAME, source.to_string())
            .map_err(syntax_error)?;
        Ok(Self { env })
    }

    /// Render against serializable data
    pub fn render<S: Serialize>(&self, data: &S) -> Result<String> {
        let template = self.env.get_template(TEMPLATE_NAME).map_err(syntax_error)?;
        Ok(template.render(data)?)
    }
}

fn environment(tags: &Tags) -> Result<Environment<'static>> {
    if tags.open.is_empty() || tags.close.is_empty() {
        return Err(LatexError::TemplateSyntax(
            "template delimiters must not be empty".to_string(),
        ));
    }
    let syntax = SyntaxConfig::builder()
        .variable_delimiters(tags.open.clone(), tags.close.clone())
        .block_delimiters(BLOCK_TAGS.0, BLOCK_TAGS.1)
        .comment_delimiters(COMMENT_TAGS.0, COMMENT_TAGS.1)
        .build()
        .map_err(syntax_error)?;

    let mut env = Environment::new();
    env.set_syntax(syntax);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.set_undefined_behavior(UndefinedBehavior::Chainable);
    env.set_formatter(skip_none);
    env.set_keep_trailing_newline(true);
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    Ok(env)
}

fn skip_none(
    out: &mut Output<'_>,
    state: &State<'_, '_>,
    value: &Value,
) -> std::result::Result<(), minijinja::Error> {
    if value.is_none() || value.is_undefined() {
        return Ok(());
    }
    minijinja::escape_formatter(out, state, value)
}

fn syntax_error(err: minijinja::Error) -> LatexError {
    LatexError::TemplateSyntax(err.to_string())
}
