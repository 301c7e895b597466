//! Shared page fixtures for unit tests.

use std::sync::Arc;

use steptrail_protocols::Viewport;

use crate::dom::{ElementSpec, MemoryDom, NodeId};

pub(crate) const PAGE_URL: &str = "https://www.example.com/docs?tab=1";
pub(crate) const PAGE_BASE: &str = "https://www.example.com/docs";

/// A small search page on a 1280x720 viewport.
pub(crate) struct SearchPage {
    pub dom: Arc<MemoryDom>,
    pub html: NodeId,
    pub body: NodeId,
    pub header: NodeId,
    pub home: NodeId,
    pub about: NodeId,
    pub form: NodeId,
    pub input: NodeId,
    pub submit: NodeId,
    pub results: NodeId,
    pub first_result: NodeId,
    pub notice: NodeId,
    pub notice_text: NodeId,
}

pub(crate) fn search_page() -> SearchPage {
    let dom = MemoryDom::new(PAGE_URL).with_viewport(Viewport::new(1280.0, 720.0));
    let html = dom.create_root(ElementSpec::new("html").rect(0.0, 0.0, 1280.0, 2000.0));
    let body = dom.append(html, ElementSpec::new("body").rect(0.0, 0.0, 1280.0, 2000.0));

    let header = dom.append(
        body,
        ElementSpec::new("div")
            .attr("class", "header")
            .rect(0.0, 0.0, 1280.0, 60.0),
    );
    let home = dom.append(
        header,
        ElementSpec::new("a")
            .attr("id", "home")
            .attr("href", "/")
            .text("Home")
            .rect(10.0, 10.0, 80.0, 40.0),
    );
    let about = dom.append(
        header,
        ElementSpec::new("a")
            .attr("href", "/about")
            .text("About")
            .rect(100.0, 10.0, 80.0, 40.0),
    );

    let form = dom.append(
        body,
        ElementSpec::new("form")
            .attr("id", "search-form")
            .rect(0.0, 100.0, 600.0, 60.0),
    );
    let input = dom.append(
        form,
        ElementSpec::new("input")
            .attr("type", "text")
            .attr("name", "q")
            .attr("placeholder", "Search the docs")
            .attr("autocomplete", "off")
            .rect(10.0, 110.0, 400.0, 40.0),
    );
    let submit = dom.append(
        form,
        ElementSpec::new("button")
            .attr("type", "submit")
            .text("Go")
            .rect(420.0, 110.0, 100.0, 40.0),
    );

    let results = dom.append(
        body,
        ElementSpec::new("ul")
            .attr("id", "results")
            .rect(0.0, 200.0, 600.0, 80.0)
            .hidden(),
    );
    let first_result = dom.append(
        results,
        ElementSpec::new("li")
            .text("First result")
            .rect(0.0, 200.0, 600.0, 40.0),
    );
    dom.append(
        results,
        ElementSpec::new("li")
            .text("Second result")
            .rect(0.0, 240.0, 600.0, 40.0),
    );

    let notice = dom.append(
        body,
        ElementSpec::new("div")
            .attr("class", "notice")
            .rect(0.0, 600.0, 400.0, 40.0),
    );
    let notice_text = dom.append(
        notice,
        ElementSpec::new("p").text("Welcome").rect(0.0, 600.0, 400.0, 40.0),
    );

    SearchPage {
        dom: Arc::new(dom),
        html,
        body,
        header,
        home,
        about,
        form,
        input,
        submit,
        results,
        first_result,
        notice,
        notice_text,
    }
}
