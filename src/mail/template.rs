use askama::Template;

use super::MailError;

/// Welcome email body; `templates/welcome.html`, HTML-escaped.
#[derive(Template)]
#[template(path = "welcome.html")]
pub struct WelcomeTemplate<'a> {
    pub name: &'a str,
}

pub fn render<T: Template>(template: &T) -> Result<String, MailError> {
    Ok(template.render()?)
}
