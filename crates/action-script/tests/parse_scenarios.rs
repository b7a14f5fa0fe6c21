use action_script::{parse_content, ParseError};
use soultest_core_types::{CommandType, SelectorSpec, SelectorStrategy};

const LOGIN_FLOW: &str = r#"
# reach the dashboard
navigate url=https://x.test
click text="Login"
assert_visible css=.dashboard
"#;

#[test]
fn login_flow_parses_in_source_order() {
    let script = parse_content(LOGIN_FLOW.trim_start()).expect("parse");
    let kinds: Vec<_> = script.iter().map(|c| c.command_type).collect();
    assert_eq!(
        kinds,
        vec![
            CommandType::Navigate,
            CommandType::Click,
            CommandType::AssertVisible
        ]
    );
    assert_eq!(script[0].param("url"), Some("https://x.test"));
    assert_eq!(script[1].selector, Some(SelectorSpec::exact_text("Login")));
    assert_eq!(script[2].selector, Some(SelectorSpec::css(".dashboard")));
}

#[test]
fn submit_button_keeps_its_fallback() {
    let script =
        parse_content("click css=button.submit fallback css=button[type=submit]").expect("parse");
    let selector = script[0].selector.as_ref().expect("selector");
    assert_eq!(selector.strategy, SelectorStrategy::Css);
    assert_eq!(selector.value, "button.submit");
    assert_eq!(selector.fallbacks.len(), 1);
    assert_eq!(selector.fallbacks[0].value, "button[type=submit]");
}

#[test]
fn attribute_selectors_keep_their_quotes() {
    let source = r#"
click xpath=//button[text()='Sign in']
click css=a[title="Hello World"] fallback xpath=//a[@title="Hello World"]
assert_visible css=input[name='q']
"#;
    let script = parse_content(source).expect("parse");
    assert_eq!(
        script[0].selector,
        Some(SelectorSpec::new(
            SelectorStrategy::Xpath,
            "//button[text()='Sign in']"
        ))
    );
    let link = script[1].selector.as_ref().expect("selector");
    assert_eq!(link.value, r#"a[title="Hello World"]"#);
    assert_eq!(link.fallbacks[0].value, r#"//a[@title="Hello World"]"#);
    assert_eq!(script[2].selector, Some(SelectorSpec::css("input[name='q']")));
}

#[test]
fn rendered_commands_parse_back_unchanged() {
    let source = r#"
click text="Login" fallback text=Sign
click xpath=//button[text()='Sign in'] fallback css=a[title="Hello World"]
assert_text css=h1 expected='It\'s "done"'
fill label="Email address" text=jane@example.com
click text="Say \"hi\""
"#;
    let script = parse_content(source).expect("parse");
    assert_eq!(script.len(), 5);
    assert!(script[0].selector.as_ref().is_some_and(|s| s.exact));
    assert_eq!(script[4].selector, Some(SelectorSpec::exact_text(r#"Say "hi""#)));

    let rendered: Vec<String> = script.iter().map(ToString::to_string).collect();
    assert_eq!(rendered[0], r#"click text="Login" fallback text=Sign"#);
    let reparsed = parse_content(&rendered.join("\n")).expect("reparse");
    assert_eq!(reparsed, script);
}

#[test]
fn camel_and_snake_names_parse_alike() {
    let snake = parse_content("assert_visible css=#main").expect("snake");
    let camel = parse_content("assertVisible css=#main").expect("camel");
    assert_eq!(snake, camel);
}

#[test]
fn form_commands_cover_every_family() {
    let source = r#"
navigate url=https://shop.test/checkout
fill placeholder="Card number" text=4242424242424242
select_option label="Country" value=NL
check testid=terms
upload_file css=input[type=file] path=/tmp/invoice.pdf
wait ms=250
wait_for_url pattern=/thanks
assert_text role=heading expected="Thank you"
assert_count css=.line-item count=3
set_variable name=order value=A-17
screenshot
"#;
    let script = parse_content(source).expect("parse");
    assert_eq!(script.len(), 11);
    assert_eq!(script[1].param("text"), Some("4242424242424242"));
    assert_eq!(
        script[2].selector.as_ref().map(|s| s.strategy),
        Some(SelectorStrategy::Label)
    );
    assert_eq!(script[7].param("expected"), Some("Thank you"));
    assert!(script[10].selector.is_none());
}

#[test]
fn error_messages_embed_the_line() {
    let source = "navigate url=https://x.test\n\nclick\n";
    let err = parse_content(source).unwrap_err();
    assert!(matches!(err, ParseError::MissingSelector { line: 3, .. }));
    assert_eq!(
        err.to_string(),
        "line 3: command 'click' requires an element selector"
    );

    let err = parse_content("navigate url=https://x.test\nassert_text css=h1 expected=\"open").unwrap_err();
    assert_eq!(err.line(), Some(2));
}
