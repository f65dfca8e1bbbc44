use scraper::{ElementRef, Html, Selector};

use super::text;

// base
pub trait DOMProcessor<T>: Sync + Send {
    fn process(&self, el: &ElementRef) -> T;
}

pub fn process_document<T>(html: &str, processor: &dyn DOMProcessor<T>) -> T {
    let document = Html::parse_document(html);
    processor.process(&document.root_element())
}

/// For markup snippets returned by AJAX endpoints.
pub fn process_fragment<T>(html: &str, processor: &dyn DOMProcessor<T>) -> T {
    let fragment = Html::parse_fragment(html);
    processor.process(&fragment.root_element())
}

// text nodes
#[derive(Default)]
pub struct TextValue {
    all_nodes: bool,
}

impl DOMProcessor<String> for TextValue {
    fn process(&self, el: &ElementRef) -> String {
        let raw: String = if self.all_nodes {
            el.text().collect()
        } else {
            el.text().next().unwrap_or_default().into()
        };
        text::sanitize_text(&raw)
    }
}

impl From<TextValue> for Box<dyn DOMProcessor<String>> {
    fn from(value: TextValue) -> Self {
        Box::new(value)
    }
}

impl TextValue {
    pub fn new() -> TextValue {
        TextValue { all_nodes: false }
    }

    pub fn all_nodes(mut self) -> Self {
        self.all_nodes = true;
        self
    }

    /// Text of the first match, `None` when nothing matches or the text is blank.
    pub fn in_scope(self, selectors: &str) -> MapValue<Option<String>, Option<String>> {
        ScopeProcessor::<String>::new(selectors, self.into())
            .map(|opt| opt.and_then(text::non_empty))
    }
}

// attributes

/// First non-blank value among `attrs`, so `["data-src", "src"]` falls back to `src`.
pub struct AttrValue {
    attrs: &'static [&'static str],
}

impl DOMProcessor<Option<String>> for AttrValue {
    fn process(&self, el: &ElementRef) -> Option<String> {
        self.attrs
            .iter()
            .filter_map(|attr| el.attr(attr))
            .map(str::trim)
            .find(|value| !value.is_empty())
            .map(str::to_owned)
    }
}

impl From<AttrValue> for Box<dyn DOMProcessor<Option<String>>> {
    fn from(value: AttrValue) -> Self {
        Box::new(value)
    }
}

impl AttrValue {
    pub fn first_of(attrs: &'static [&'static str]) -> AttrValue {
        AttrValue { attrs }
    }

    pub fn in_scope(self, selectors: &str) -> MapValue<Option<Option<String>>, Option<String>> {
        ScopeProcessor::<Option<String>>::new(selectors, self.into()).map(|opt| opt.flatten())
    }
}

pub fn optional_text_value(selectors: &str) -> Box<dyn DOMProcessor<Option<String>>> {
    TextValue::new().all_nodes().in_scope(selectors).into()
}

pub fn optional_attr_value(
    selectors: &str,
    attrs: &'static [&'static str],
) -> Box<dyn DOMProcessor<Option<String>>> {
    AttrValue::first_of(attrs).in_scope(selectors).into()
}

// transformation

pub struct ExtractValue<Out> {
    extract: Box<dyn Fn(&ElementRef) -> Out + Sync + Send>,
}

impl<Out> DOMProcessor<Out> for ExtractValue<Out> {
    fn process(&self, el: &ElementRef) -> Out {
        (self.extract)(el)
    }
}

impl<Out: 'static> From<ExtractValue<Out>> for Box<dyn DOMProcessor<Out>> {
    fn from(value: ExtractValue<Out>) -> Self {
        Box::new(value)
    }
}

impl<Out> ExtractValue<Out> {
    pub fn new<Extract>(extract: Extract) -> ExtractValue<Out>
    where
        Extract: Fn(&ElementRef) -> Out + Sync + Send + 'static,
    {
        ExtractValue {
            extract: Box::new(extract),
        }
    }
}

pub struct MapValue<In, Out> {
    map: Box<dyn Fn(In) -> Out + Sync + Send>,
    sub_processor: Box<dyn DOMProcessor<In>>,
}

impl<In, Out> DOMProcessor<Out> for MapValue<In, Out> {
    fn process(&self, el: &ElementRef) -> Out {
        (self.map)(self.sub_processor.process(el))
    }
}

impl<In: 'static, Out: 'static> From<MapValue<In, Out>> for Box<dyn DOMProcessor<Out>> {
    fn from(value: MapValue<In, Out>) -> Self {
        Box::new(value)
    }
}

impl<In, Out> MapValue<In, Out> {
    pub fn new<Map>(map: Map, sub_processor: Box<dyn DOMProcessor<In>>) -> MapValue<In, Out>
    where
        Map: Fn(In) -> Out + 'static + Sync + Send,
    {
        MapValue {
            map: Box::new(map),
            sub_processor,
        }
    }
}

// lists
pub struct ItemsProcessor<Item> {
    scope: Selector,
    item_processor: Box<dyn DOMProcessor<Item>>,
}

impl<Item> DOMProcessor<Vec<Item>> for ItemsProcessor<Item> {
    fn process(&self, el: &ElementRef) -> Vec<Item> {
        el.select(&self.scope)
            .map(|e| self.item_processor.process(&e))
            .collect()
    }
}

impl<Item: 'static> From<ItemsProcessor<Item>> for Box<dyn DOMProcessor<Vec<Item>>> {
    fn from(value: ItemsProcessor<Item>) -> Self {
        Box::new(value)
    }
}

impl<Item> ItemsProcessor<Item> {
    pub fn new(scope: &str, item_processor: Box<dyn DOMProcessor<Item>>) -> ItemsProcessor<Item> {
        ItemsProcessor {
            scope: parse_selector(scope),
            item_processor,
        }
    }
}

impl<Item: 'static> ItemsProcessor<Option<Item>> {
    /// Drops the rows whose item processor gave up.
    pub fn flatten(self) -> MapValue<Vec<Option<Item>>, Vec<Item>> {
        MapValue::new(
            |items: Vec<Option<Item>>| items.into_iter().flatten().collect(),
            self.into(),
        )
    }
}

// scope

pub struct ScopeProcessor<Item> {
    scope: Selector,
    item_processor: Box<dyn DOMProcessor<Item>>,
}

impl<Item> DOMProcessor<Option<Item>> for ScopeProcessor<Item> {
    fn process(&self, el: &ElementRef) -> Option<Item> {
        el.select(&self.scope)
            .next()
            .map(|e| self.item_processor.process(&e))
    }
}

impl<Item: 'static> From<ScopeProcessor<Item>> for Box<dyn DOMProcessor<Option<Item>>> {
    fn from(value: ScopeProcessor<Item>) -> Self {
        Box::new(value)
    }
}

impl<Item> ScopeProcessor<Item> {
    pub fn new(scope: &str, item_processor: Box<dyn DOMProcessor<Item>>) -> ScopeProcessor<Item> {
        ScopeProcessor {
            scope: parse_selector(scope),
            item_processor,
        }
    }
}

impl<Item: 'static> ScopeProcessor<Item> {
    pub fn map<Map, Out>(self, map: Map) -> MapValue<Option<Item>, Out>
    where
        Map: Fn(Option<Item>) -> Out + 'static + Sync + Send,
    {
        MapValue::new(map, self.into())
    }
}

// Selectors are compile-time constants of this crate.
fn parse_selector(selectors: &str) -> Selector {
    Selector::parse(selectors).unwrap_or_else(|e| panic!("invalid selector {selectors:?}: {e:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <div class="card">
            <a class="title" href="/movie/a-1">  First
                title </a>
            <img class="poster" data-src="" src="/a.jpg">
        </div>
        <div class="card">
            <a class="title" href="/tv/b-2">Second</a>
            <img class="poster" data-src="/b-lazy.jpg" src="/b.jpg">
        </div>
        <div class="card"><span>broken</span></div>
    "#;

    #[test]
    fn should_prefer_first_non_blank_attr() {
        let posters: Vec<Option<String>> = process_document(
            PAGE,
            &ItemsProcessor::new(".card", optional_attr_value("img.poster", &["data-src", "src"])),
        );

        assert_eq!(
            posters,
            vec![Some("/a.jpg".into()), Some("/b-lazy.jpg".into()), None]
        );
    }

    #[test]
    fn should_sanitize_text_and_skip_blank() {
        let titles: Vec<String> = process_document(
            PAGE,
            &ItemsProcessor::new(".card", optional_text_value("a.title")).flatten(),
        );

        assert_eq!(titles, vec!["First title".to_owned(), "Second".to_owned()]);
    }

    #[test]
    fn should_process_fragments() {
        let hrefs: Vec<String> = process_fragment(
            r#"<a class="title" href="/x">x</a><a class="title">y</a>"#,
            &ItemsProcessor::<Option<String>>::new("a.title", AttrValue::first_of(&["href"]).into())
                .flatten(),
        );

        assert_eq!(hrefs, vec!["/x".to_owned()]);
    }
}
