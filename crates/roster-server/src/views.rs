//! Server-rendered HTML pages.
//!
//! Pages are `minijinja` templates compiled into the binary. Every template
//! name ends in `.html`, so minijinja escapes interpolated values.

use minijinja::{context, Environment};
use serde::Serialize;

use roster_core::{Account, AccountForm, Error, Result};

fn template_source(name: &str) -> Option<&'static str> {
    match name {
        "layout.html" => Some(include_str!("../templates/layout.html")),
        "partials.html" => Some(include_str!("../templates/partials.html")),
        "index.html" => Some(include_str!("../templates/index.html")),
        "new.html" => Some(include_str!("../templates/new.html")),
        "show.html" => Some(include_str!("../templates/show.html")),
        "edit.html" => Some(include_str!("../templates/edit.html")),
        "error.html" => Some(include_str!("../templates/error.html")),
        _ => None,
    }
}

/// The page templates.
#[derive(Debug)]
pub struct Views {
    env: Environment<'static>,
}

impl Default for Views {
    fn default() -> Self {
        Self::new()
    }
}

impl Views {
    /// Creates an environment that loads the built-in templates on first use.
    #[must_use]
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_loader(|name| Ok(template_source(name).map(str::to_string)));
        Self { env }
    }

    fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .map_err(|err| Error::render(format!("{name}: {err}")))
    }

    /// Listing page with every account in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if the template fails.
    pub fn index(&self, accounts: &[Account]) -> Result<String> {
        self.render("index.html", context! { accounts => accounts })
    }

    /// Creation form, optionally showing a validation error and the values
    /// that were submitted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if the template fails.
    pub fn new_account(&self, error: Option<&str>, form: &AccountForm) -> Result<String> {
        self.render("new.html", context! { error => error, form => form })
    }

    /// Detail page for one account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if the template fails.
    pub fn show(&self, account: &Account) -> Result<String> {
        self.render("show.html", context! { account => account })
    }

    /// Edit form for an account's content.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if the template fails.
    pub fn edit(&self, account: &Account) -> Result<String> {
        self.render("edit.html", context! { account => account })
    }

    /// Error page shown for failed requests.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if the template fails.
    pub fn error_page(&self, status: u16, message: &str) -> Result<String> {
        self.render("error.html", context! { status => status, message => message })
    }
}
