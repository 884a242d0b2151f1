//! User-Agent Stylesheet
//!
//! [WHATWG HTML § 15 Rendering](https://html.spec.whatwg.org/multipage/rendering.html)
//!
//! UA rules have the lowest priority in the cascade: any author rule
//! overrides a UA rule regardless of specificity. Only the rules that affect
//! box generation and sizing are included.

use std::sync::OnceLock;

use crate::parser::{Stylesheet, parse_stylesheet};

/// [WHATWG HTML § 15.3](https://html.spec.whatwg.org/multipage/rendering.html#the-css-user-agent-style-sheet-and-presentational-hints)
const UA_CSS: &str = r"
area, base, basefont, datalist, head, link, meta, noembed,
noframes, param, rp, script, style, template, title {
    display: none;
}

address, article, aside, blockquote, body, center, dd, details,
dialog, dir, div, dl, dt, fieldset, figcaption, figure, footer,
form, h1, h2, h3, h4, h5, h6, header, hgroup, hr, html, legend,
listing, main, menu, nav, ol, p, plaintext, pre, search,
section, summary, ul, xmp {
    display: block;
}

li { display: list-item; }

h1 { font-size: 2em; margin: 0.67em 0; }
h2 { font-size: 1.5em; margin: 0.83em 0; }
h3 { font-size: 1.17em; margin: 1em 0; }
h4 { margin: 1.33em 0; }
h5 { font-size: 0.83em; margin: 1.67em 0; }
h6 { font-size: 0.67em; margin: 2.33em 0; }

p, blockquote, figure, listing, plaintext, pre, xmp { margin-top: 1em; margin-bottom: 1em; }
blockquote, figure { margin-left: 40px; margin-right: 40px; }
ol, ul, menu { margin-top: 1em; margin-bottom: 1em; padding-left: 40px; }

body { margin: 8px; }

input, textarea, select, button {
    display: inline-block;
    border-width: 2px;
    padding: 1px 2px;
}

table { display: table; }
td, th { display: table-cell; padding: 1px; }
tr { display: table-row; }
";

/// The parsed UA stylesheet, parsed once.
#[must_use]
pub fn ua_stylesheet() -> &'static Stylesheet {
    static STYLESHEET: OnceLock<Stylesheet> = OnceLock::new();
    STYLESHEET.get_or_init(|| parse_stylesheet(UA_CSS))
}
