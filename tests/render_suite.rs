use std::path::Path;

use railroad_rs_renderer::backend::Recorder;
use railroad_rs_renderer::config::Config;
use railroad_rs_renderer::ir::Grammar;
use railroad_rs_renderer::layout::{LayoutError, compute_layout};
use railroad_rs_renderer::render::render;
use railroad_rs_renderer::{parse_grammar, render_html, render_svg, render_tikz};

const FIXTURES: [&str; 4] = ["arithmetic.ebnf", "json.ebnf", "nested.ebnf", "pl0.ebnf"];

fn load(name: &str) -> Grammar {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    let input = std::fs::read_to_string(&path).expect("fixture read failed");
    parse_grammar(&input).unwrap_or_else(|err| panic!("{name}: {err}"))
}

fn split_config() -> Config {
    let mut config = Config::default();
    config.render.split_productions = true;
    config
}

#[test]
fn svg_renders_all_fixtures() {
    for name in FIXTURES {
        let grammar = load(name);
        let docs = render_svg(&grammar, &Config::default()).expect("svg render failed");
        assert_eq!(docs.len(), 1, "{name}");
        let svg = &docs[0].content;
        assert!(svg.contains("<svg"), "{name}: missing <svg tag");
        assert!(svg.contains("</svg>"), "{name}: missing </svg tag");
        assert!(svg.contains("class=\"end\""), "{name}: missing terminator");
        assert_eq!(
            svg.matches("<a ").count(),
            svg.matches("</a>").count(),
            "{name}: unbalanced links"
        );
    }
}

#[test]
fn split_mode_emits_one_document_per_production() {
    for name in FIXTURES {
        let grammar = load(name);
        let docs = render_svg(&grammar, &split_config()).expect("svg render failed");
        let names: Vec<&str> = docs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, grammar.production_names(), "{name}");
    }
}

#[test]
fn html_and_tikz_render_all_fixtures() {
    for name in FIXTURES {
        let grammar = load(name);
        let page = render_html(&grammar, &split_config()).expect("html render failed");
        for production in grammar.production_names() {
            assert!(
                page.content.contains(&format!("<a name=\"{production}\">")),
                "{name}: no anchor for {production}"
            );
        }

        let tex = render_tikz(&grammar, &Config::default()).expect("tikz render failed");
        assert_eq!(tex.len(), 1, "{name}");
        assert_eq!(
            tex[0].content.matches("\\begin{tikzpicture}").count(),
            tex[0].content.matches("\\end{tikzpicture}").count()
        );
    }
}

#[test]
fn rendering_is_deterministic() {
    for name in FIXTURES {
        let grammar = load(name);
        let mut first = Recorder::new();
        let mut second = Recorder::new();
        render(&mut first, &grammar, &Config::default()).unwrap();
        render(&mut second, &grammar, &Config::default()).unwrap();
        assert_eq!(first.calls(), second.calls(), "{name}");
        assert_eq!(first.open_frames(), 0, "{name}");
        assert!(!first.paths().is_empty(), "{name}");
    }
}

#[test]
fn boxes_are_well_formed() {
    for name in FIXTURES {
        let grammar = load(name);
        let layout = compute_layout(&grammar, &Config::default().layout).unwrap();
        for (id, placed) in layout.boxes.iter() {
            assert!(placed.width() >= 0.0, "{name}: {id} has negative width");
            assert!(placed.height() >= 0.0, "{name}: {id} has negative height");
        }
        assert!(layout.width > 0.0 && layout.height > 0.0, "{name}");
    }
}

#[test]
fn deep_grammars_are_rejected_not_overflowed() {
    let source = format!("deep = {}\"x\"{} .", "[".repeat(100), "]".repeat(100));
    let grammar = parse_grammar(&source).unwrap();
    let mut config = Config::default();
    config.layout.max_depth = 64;
    let err = render_svg(&grammar, &config).unwrap_err();
    assert_eq!(
        err.downcast_ref::<LayoutError>(),
        Some(&LayoutError::NestingTooDeep(64))
    );
}
