use minijinja::{Environment, context};

use crate::page::PageView;

const PAGE_TEMPLATE_NAME: &str = "page.html";
const PAGE_TEMPLATE: &str = include_str!("../templates/page.html");

/// Turns a [`PageView`] into HTML. Values are auto-escaped because the
/// template name ends in `.html`.
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(PAGE_TEMPLATE_NAME, PAGE_TEMPLATE)?;
        Ok(Self { env })
    }

    pub fn render(&self, page: &PageView) -> Result<String, minijinja::Error> {
        self.env
            .get_template(PAGE_TEMPLATE_NAME)?
            .render(context! { page => page })
    }
}
