use std::time::Duration;

pub const SITE_ROOT: &str = "https://www.sadia.com.br/";
pub const SITE_DOMAIN: &str = "sadia.com.br";

/// Path prefix shared by every catalog page, category roots included.
pub const CATALOG_SEGMENT: &str = "/produtos/";

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const CATEGORY_DELAY: Duration = Duration::from_secs(3);
pub const PRODUCT_DELAY: Duration = Duration::from_secs(2);

pub const DATA_DIR: &str = "dados";
pub const URLS_FILE: &str = "urls_produtos.json";
pub const PRODUCTS_FILE: &str = "produtos_sadia.csv";

/// A catalog category and the listing page that links to its products.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub name: &'static str,
    pub url: &'static str,
}

const fn category(name: &'static str, url: &'static str) -> Category {
    Category { name, url }
}

pub const CATEGORIES: &[Category] = &[
    category("NBA", "https://www.sadia.com.br/produtos/nba"),
    category("AVES", "https://www.sadia.com.br/produtos/aves"),
    category("FRIOS", "https://www.sadia.com.br/produtos/frios"),
    category("LANCHES", "https://www.sadia.com.br/produtos/lanches"),
    category("SUINOS", "https://www.sadia.com.br/produtos/suinos"),
    category("LINGUICA", "https://www.sadia.com.br/produtos/linguicas"),
    category("PRATOS", "https://www.sadia.com.br/produtos/pratos-prontos"),
    category("PESCADOS", "https://www.sadia.com.br/produtos/pescados"),
    category("SALSICHAS", "https://www.sadia.com.br/produtos/salsichas"),
    category("SOBREMESAS", "https://www.sadia.com.br/produtos/sobremesas"),
    category("VEGETAIS", "https://www.sadia.com.br/produtos/vegetais"),
    category("COMEMORATIVOS", "https://www.sadia.com.br/produtos/comemorativos"),
];

/// Catalog root plus every category root: listing pages, never products.
pub fn index_urls() -> impl Iterator<Item = &'static str> {
    std::iter::once("https://www.sadia.com.br/produtos/").chain(CATEGORIES.iter().map(|c| c.url))
}

/// Product pages used by `extract` when no discovered-URL file is available.
pub const FALLBACK_PRODUCT_URLS: &[&str] = &[
    "https://www.sadia.com.br/produtos/aves/linha-dia-a-dia/frango-inteiro-sem-miudos-4/",
    "https://www.sadia.com.br/produtos/nba/nba/empanadissimo-100-peito-de-frango-leve-picancia/",
    "https://www.sadia.com.br/produtos/frios/frios-dia-a-dia/presunto-cozido-fatiado-180g/",
    "https://www.sadia.com.br/produtos/frios/frios-dia-a-dia/mignoneto/",
    "https://www.sadia.com.br/produtos/lanches/batatas-fritas/batata-palito-pre-frita-105kg/",
    "https://www.sadia.com.br/produtos/lanches/batatas-fritas/batata-palito-pre-frita-2kg/",
    "https://www.sadia.com.br/produtos/linguicas/linguica-defumada/linguica-fininha-25kg/",
];
