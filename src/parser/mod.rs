pub mod nutrients;
pub mod product;
pub mod value;

use scraper::{ElementRef, Html};

use crate::store::ProductRecord;

/// Product page → record: name, category, nutrition table. Never fails;
/// missing markup degrades to sentinels and defaults.
pub fn process_page(url: &str, html: &str) -> ProductRecord {
    let doc = Html::parse_document(html);
    ProductRecord {
        name: product::extract_name(&doc),
        url: url.to_string(),
        category: product::extract_category(&doc),
        nutrients: product::extract_nutrients(&doc),
    }
}

/// Element text with every text node trimmed, joined without separators.
pub(crate) fn text_of(el: ElementRef) -> String {
    el.text().map(str::trim).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::nutrients::NutrientRecord;
    use crate::parser::product::{CATEGORY_NOT_FOUND, NAME_NOT_FOUND};

    const PAGE: &str = r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
  <meta property="og:url" content="https://www.sadia.com.br/produtos/frios/frios-dia-a-dia/mignoneto">
  <title>Mignoneto | Sadia</title>
</head>
<body>
  <nav class="breadcrumb">
    <a href="/">Início</a>
    <a href="/produtos/frios">Frios</a>
    <a href="/produtos/frios/frios-dia-a-dia">Frios dia a dia</a>
  </nav>
  <h1 class="title-product">mignoneto</h1>
  <div class="box-nutritional-table">
    <table>
      <thead><tr><th>Porção de 100 g</th><th>Quantidade</th><th>%VD(*)</th></tr></thead>
      <tbody>
        <tr><td>Valor energético</td><td>105 kcal = 441 kJ</td><td>5</td></tr>
        <tr><td>Valor energético (kcal)</td><td>105</td><td>5</td></tr>
        <tr><td>Carboidratos (g)</td><td>1,2</td><td>0</td></tr>
        <tr><td>Proteínas (g)</td><td>18</td><td>24</td></tr>
        <tr><td>Gorduras totais (g)</td><td>3,1</td><td>6</td></tr>
        <tr><td>Gorduras saturadas (g)</td><td>1,0</td><td>5</td></tr>
        <tr><td>Fibra alimentar (g)</td><td>0</td><td>0</td></tr>
        <tr><td>Sódio (mg)</td><td>1.020</td><td>43</td></tr>
      </tbody>
    </table>
  </div>
</body>
</html>"#;

    #[test]
    fn full_product_page() {
        let rec = process_page("https://www.sadia.com.br/produtos/frios/frios-dia-a-dia/mignoneto", PAGE);
        assert_eq!(rec.name, "Mignoneto - Sadia");
        assert_eq!(rec.category, "Frios");
        assert_eq!(rec.url, "https://www.sadia.com.br/produtos/frios/frios-dia-a-dia/mignoneto");
        let n = rec.nutrients;
        assert_eq!(n.portion_g, 100.0);
        assert_eq!(n.calories_kcal, 105.0);
        assert_eq!(n.carbohydrates_g, 1.2);
        assert_eq!(n.protein_g, 18.0);
        assert_eq!(n.total_fat_g, 3.1);
        assert_eq!(n.saturated_fat_g, 1.0);
        assert_eq!(n.fiber_g, 0.0);
        assert_eq!(n.sugars_g, 0.0);
        assert_eq!(n.sodium_mg, 1020.0);
    }

    #[test]
    fn empty_page_degrades_to_sentinels() {
        let rec = process_page("https://www.sadia.com.br/produtos/aves/x", "");
        assert_eq!(rec.name, NAME_NOT_FOUND);
        assert_eq!(rec.category, CATEGORY_NOT_FOUND);
        assert_eq!(rec.nutrients, NutrientRecord::default());
    }

    #[test]
    fn malformed_markup_still_parses() {
        let rec = process_page(
            "u",
            r#"<h1 class="title-product">salsicha<div class="box-nutritional-table"><table><tr><td>Sódio<td>12,5"#,
        );
        assert!(rec.name.starts_with("Salsicha"));
        assert!(rec.name.ends_with(" - Sadia"));
        assert_eq!(rec.nutrients.portion_g, 100.0);
    }
}
