/// Fixed naming conventions of the catalog corpus.
///
/// Expected layout (all paths relative to the corpus root):
///   top.html                      root listing: category headings + links
///   {any}list.html                nested listing pages
///   {prefix}menu.html             per-book table of contents, prefix = "A001"
///   {prefix}{7 digits}.html       volume documents linked from a menu
///   {prefix}{4 digits}.html       volume documents probed by the scan fallback
#[derive(Debug, Clone)]
pub struct CorpusLayout {
    pub root_document: &'static str,
    pub listing_suffix: &'static str,
    pub menu_suffix: &'static str,
    /// Highest sequence number probed by the scan fallback.
    pub scan_limit: u32,
    /// Probes allowed after the first miss before the scan gives up.
    pub scan_miss_budget: u32,
    pub library_title: &'static str,
}

impl Default for CorpusLayout {
    fn default() -> Self {
        CorpusLayout {
            root_document: "top.html",
            listing_suffix: "list.html",
            menu_suffix: "menu.html",
            scan_limit: 100,
            scan_miss_budget: 10,
            library_title: "東方學デジタル圖書館 漢籍目錄",
        }
    }
}

impl CorpusLayout {
    /// `{prefix}menu.html`
    pub fn menu_file_name(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.menu_suffix)
    }

    /// `{prefix}{seq:04}.html`, the name probed by the scan fallback.
    pub fn scan_file_name(&self, prefix: &str, seq: u32) -> String {
        format!("{prefix}{seq:04}.html")
    }

    pub fn is_listing(&self, file_name: &str) -> bool {
        file_name.ends_with(self.listing_suffix)
    }

    /// Entry links that already point at a table of contents (or a book's
    /// own top page) are used as the menu document directly.
    pub fn is_menu_or_top(&self, file_name: &str) -> bool {
        file_name.ends_with(self.menu_suffix) || file_name.ends_with(self.root_document)
    }
}

pub const OUTPUT_DIR: &str = "output";
pub const SNAPSHOT_FILE: &str = "library.json";
