//! HTML pages rendered with minijinja
//!
//! Templates are compiled into the binary and auto-escaped.

use common::{ExpiryCode, ShareBundle};
use minijinja::{Environment, context};
use serde::Serialize;

/// Why a share page cannot be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailable {
    NotFound,
    Expired,
}

#[derive(Serialize)]
struct ExpiryOption {
    code: &'static str,
    label: &'static str,
    selected: bool,
}

/// Compiled page templates
#[derive(Debug)]
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("base.html", include_str!("../templates/base.html"))?;
        env.add_template("index.html", include_str!("../templates/index.html"))?;
        env.add_template("download.html", include_str!("../templates/download.html"))?;
        env.add_template(
            "unavailable.html",
            include_str!("../templates/unavailable.html"),
        )?;
        Ok(Self { env })
    }

    /// Upload page
    pub fn render_index(&self) -> Result<String, minijinja::Error> {
        let options: Vec<ExpiryOption> = ExpiryCode::ALL
            .iter()
            .map(|code| ExpiryOption {
                code: code.as_str(),
                label: expiry_label(*code),
                selected: *code == ExpiryCode::default(),
            })
            .collect();

        self.env
            .get_template("index.html")?
            .render(context! { expiry_options => options })
    }

    /// Landing page for a live share
    pub fn render_download(&self, bundle: &ShareBundle) -> Result<String, minijinja::Error> {
        self.env.get_template("download.html")?.render(context! {
            share_id => bundle.id.to_string(),
            file_count => bundle.file_count(),
            has_password => bundle.has_password,
            expires_at => bundle.expires_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        })
    }

    /// Page shown for unknown or expired links
    pub fn render_unavailable(&self, reason: Unavailable) -> Result<String, minijinja::Error> {
        let (title, message) = match reason {
            Unavailable::NotFound => (
                "Share not found",
                "This link does not point to any share. Check that it was copied completely.",
            ),
            Unavailable::Expired => (
                "Share expired",
                "This share has expired and its files are no longer available.",
            ),
        };

        self.env
            .get_template("unavailable.html")?
            .render(context! { title, message })
    }
}

fn expiry_label(code: ExpiryCode) -> &'static str {
    match code {
        ExpiryCode::OneHour => "1 hour",
        ExpiryCode::OneDay => "24 hours",
        ExpiryCode::SevenDays => "7 days",
    }
}
