//! Scripts parsed from text and resolved against an in-memory page.

use std::sync::Arc;
use std::time::Duration;

use action_locator::{
    DefaultElementResolver, ElementResolver, LocatorConfig, LocatorError, PageElement, StaticPage,
};
use action_script::parse_content;

fn resolver(page: StaticPage) -> DefaultElementResolver {
    DefaultElementResolver::with_config(
        Arc::new(page),
        LocatorConfig {
            attempt_timeout: Duration::ZERO,
            poll_interval: Duration::from_millis(10),
        },
    )
}

fn login_page() -> StaticPage {
    StaticPage::with_elements([
        PageElement::new("login", "button")
            .css("button.login")
            .xpath("//button[text()='Login']")
            .text("Login"),
        PageElement::new("help", "a")
            .css("a[title=\"Login help\"]")
            .text("Login help"),
    ])
}

#[tokio::test]
async fn quoted_text_picks_the_exact_element() {
    let script = parse_content("click text=\"Login\"").unwrap();
    let selector = script[0].selector.as_ref().unwrap();

    let result = resolver(login_page()).resolve(selector).await.unwrap();
    assert_eq!(result.element.id, "login");
}

#[tokio::test]
async fn unquoted_text_still_reports_ambiguity() {
    let script = parse_content("click text=Login").unwrap();
    let selector = script[0].selector.as_ref().unwrap();

    let err = resolver(login_page()).resolve(selector).await.unwrap_err();
    assert_eq!(
        err,
        LocatorError::AmbiguousMatch {
            selector: "text=Login".into(),
            count: 2
        }
    );
}

#[tokio::test]
async fn attribute_selectors_with_quotes_resolve() {
    let script = parse_content(
        "click xpath=//button[text()='Login']\nclick css=a[title=\"Login help\"]",
    )
    .unwrap();
    let resolver = resolver(login_page());

    let button = resolver.resolve(script[0].selector.as_ref().unwrap()).await.unwrap();
    assert_eq!(button.element.id, "login");
    let link = resolver.resolve(script[1].selector.as_ref().unwrap()).await.unwrap();
    assert_eq!(link.element.id, "help");
}

#[tokio::test]
async fn rendered_script_resolves_like_the_source() {
    let script = parse_content("click css=#gone fallback text=\"Login\"").unwrap();
    let rendered = script[0].to_string();
    assert_eq!(rendered, "click css=#gone fallback text=\"Login\"");

    let reparsed = parse_content(&rendered).unwrap();
    let result = resolver(login_page())
        .resolve(reparsed[0].selector.as_ref().unwrap())
        .await
        .unwrap();
    assert_eq!(result.element.id, "login");
    assert_eq!(result.chain_index, 1);
}
