use crate::sites::{NavNode, Page};
use crate::url::resolve_link;
use crate::{ConfigError, ExtractError};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Parses nested `ul > li` navigation menus
///
/// Each `li` contributes one node: its label and link come from the first
/// non-list child element, its children from a nested `ul`.
pub struct MenuParser {
    menu: Selector,
}

impl MenuParser {
    pub fn new(menu: &str) -> Result<Self, ConfigError> {
        let menu = Selector::parse(menu).map_err(|e| ConfigError::InvalidSelector {
            selector: menu.to_string(),
            message: format!("{:?}", e),
        })?;
        Ok(Self { menu })
    }

    pub fn parse(&self, page: &Page<'_>) -> Result<Vec<NavNode>, ExtractError> {
        let document = Html::parse_document(page.body);

        let menu = document
            .select(&self.menu)
            .next()
            .ok_or_else(|| ExtractError::failed(page.url.as_str(), "navigation menu not found"))?;

        let nodes = parse_list(menu, page.url);
        if nodes.is_empty() {
            return Err(ExtractError::failed(
                page.url.as_str(),
                "navigation menu has no entries",
            ));
        }

        Ok(nodes)
    }
}

fn parse_list(list: ElementRef<'_>, base_url: &Url) -> Vec<NavNode> {
    list.children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "li")
        .filter_map(|item| parse_item(item, base_url))
        .collect()
}

fn parse_item(item: ElementRef<'_>, base_url: &Url) -> Option<NavNode> {
    let mut label = None;
    let mut url = None;
    let mut children = Vec::new();

    for child in item.children().filter_map(ElementRef::wrap) {
        if child.value().name() == "ul" {
            children.extend(parse_list(child, base_url));
        } else if label.is_none() {
            label = Some(collapse_whitespace(&child.text().collect::<String>()));
            url = link_of(child).and_then(|href| resolve_link(href, base_url));
        }
    }

    let label = label.filter(|l| !l.is_empty())?;
    Some(NavNode {
        label,
        url,
        children,
    })
}

/// The element's own `href`, or that of its first descendant anchor
fn link_of(element: ElementRef<'_>) -> Option<&str> {
    if let Some(href) = element.value().attr("href") {
        return Some(href);
    }
    element
        .descendants()
        .filter_map(ElementRef::wrap)
        .find_map(|e| e.value().attr("href"))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
