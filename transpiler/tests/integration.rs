use transpiler::{RenderConfig, compile, render};

fn html(source: &str) -> String {
    compile(source, &RenderConfig::default()).expect("compile failed")
}

fn pretty(source: &str) -> String {
    compile(source, &RenderConfig::pretty(2)).expect("compile failed")
}

#[test]
fn text_element() {
    assert_eq!(html(r#"p "Hi""#), "<p>Hi</p>");
}

#[test]
fn self_closing_element() {
    assert_eq!(
        html(r#"meta[charset="UTF-8"]."#),
        r#"<meta charset="UTF-8" />"#
    );
    assert_eq!(html("br."), "<br />");
}

#[test]
fn empty_block() {
    assert_eq!(html("div { }"), "<div></div>");
}

#[test]
fn doctype_and_nesting() {
    assert_eq!(
        html(r#"!html! html { body { h1 "X" } }"#),
        "<!DOCTYPE html>\n<html><body><h1>X</h1></body></html>"
    );
}

#[test]
fn parse_errors_propagate() {
    let err = compile(r#"div[a="1",]"#, &RenderConfig::default()).unwrap_err();
    assert_eq!(err.kind, btml::ParseErrorKind::UnexpectedToken);

    let err = compile("div {", &RenderConfig::default()).unwrap_err();
    assert_eq!(err.kind, btml::ParseErrorKind::UnclosedBlock);
}

#[test]
fn deep_nesting_is_an_error_not_a_crash() {
    let depth = 5000;
    let source = "div {".repeat(depth) + &"}".repeat(depth);
    let err = compile(&source, &RenderConfig::default()).unwrap_err();
    assert_eq!(
        err.kind,
        btml::ParseErrorKind::NestingTooDeep {
            limit: btml::MAX_NESTING_DEPTH
        }
    );
    let expected = format!(
        "blocks nested deeper than {} levels at 1:{}, found `{{`",
        btml::MAX_NESTING_DEPTH,
        btml::MAX_NESTING_DEPTH * 5 + 5
    );
    assert_eq!(err.to_string(), expected);
}

#[test]
fn deepest_accepted_nesting_renders_pretty() {
    let depth = btml::MAX_NESTING_DEPTH;
    let source = "div {".repeat(depth) + &"}".repeat(depth);
    let output = compile(&source, &RenderConfig::pretty(2)).unwrap();
    assert_eq!(output.matches("<div>").count(), depth);
    assert_eq!(output.lines().count(), depth * 2 - 1);
}

#[test]
fn attribute_order_is_preserved() {
    assert_eq!(
        html(r#"a[id="x", href="/", class="c"] "go""#),
        r#"<a id="x" href="/" class="c">go</a>"#
    );
}

#[test]
fn duplicate_attributes_are_rendered_as_written() {
    assert_eq!(
        html(r#"div[class="a", class="b"] { }"#),
        r#"<div class="a" class="b"></div>"#
    );
}

#[test]
fn text_is_escaped_once() {
    assert_eq!(
        html(r#"p "1 < 2 & 3 > 2""#),
        "<p>1 &lt; 2 &amp; 3 &gt; 2</p>"
    );
    assert_eq!(html(r#"p "&lt;""#), "<p>&amp;lt;</p>");
    assert_eq!(html(r#"p "say \"hi\"""#), r#"<p>say "hi"</p>"#);
}

#[test]
fn attribute_values_escape_quotes() {
    assert_eq!(
        html(r#"button[onclick="alert(\"<hi>\")"] "Go""#),
        r#"<button onclick="alert(&quot;&lt;hi&gt;&quot;)">Go</button>"#
    );
    assert_eq!(
        html(r#"button[onclick="alert('Hello, world!')"] "Click Me""#),
        r#"<button onclick="alert('Hello, world!')">Click Me</button>"#
    );
}

#[test]
fn self_closing_never_emits_closing_tag() {
    let output = html(r#"div { img[src="a.png"]. hr. }"#);
    assert_eq!(output, r#"<div><img src="a.png" /><hr /></div>"#);
    assert!(!output.contains("</img>"));
    assert!(!output.contains("</hr>"));
}

#[test]
fn demo_page_pretty() {
    let source = r#"
!html!
html[lang="en"] {
    head {
        meta[charset="UTF-8"].
        title "My First Web Page"
    }
    body {
        h1 "Welcome to My Web Page"
        p "This is a simple HTML example with a button below."
        button[onclick="alert('Hello, world!')"] "Click Me"
    }
}"#;
    let expected = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <title>My First Web Page</title>
  </head>
  <body>
    <h1>Welcome to My Web Page</h1>
    <p>This is a simple HTML example with a button below.</p>
    <button onclick="alert('Hello, world!')">Click Me</button>
  </body>
</html>"#;
    assert_eq!(pretty(source), expected);
}

#[test]
fn pretty_and_compact_differ_only_in_whitespace() {
    let source = r#"ul[class="x"] { li "a" li { span "b" } li. }"#;
    let stripped: String = pretty(source)
        .lines()
        .map(str::trim_start)
        .collect();
    assert_eq!(stripped, html(source));
}

#[test]
fn reformatted_source_renders_identically() {
    let source = r#"!html! html { body[class="main"] { p "a \\ b" br. div { } } }"#;
    let document = btml::parse(source).unwrap();
    let reparsed = btml::parse(&document.to_string()).unwrap();
    assert_eq!(reparsed, document);
    assert_eq!(
        render(&reparsed, &RenderConfig::default()),
        render(&document, &RenderConfig::default())
    );
}

#[test]
fn documents_render_on_many_threads() {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                compile(&format!("p \"{i}\""), &RenderConfig::default())
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), Ok(format!("<p>{i}</p>")));
    }
}
