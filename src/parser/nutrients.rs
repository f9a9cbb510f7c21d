use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use serde::Serialize;

use super::text_of;
use super::value::normalize;

static ROW_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td, th").unwrap());

/// Values in the nutrition table are always stated per 100 g.
pub const PORTION_G: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nutrient {
    Portion,
    Calories,
    Carbohydrates,
    Protein,
    TotalFat,
    SaturatedFat,
    Fiber,
    Sugars,
    Sodium,
}

impl Nutrient {
    /// Canonical field order, shared by the record and the CSV columns.
    pub const ALL: [Nutrient; 9] = [
        Nutrient::Portion,
        Nutrient::Calories,
        Nutrient::Carbohydrates,
        Nutrient::Protein,
        Nutrient::TotalFat,
        Nutrient::SaturatedFat,
        Nutrient::Fiber,
        Nutrient::Sugars,
        Nutrient::Sodium,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Nutrient::Portion => "PORCAO (g)",
            Nutrient::Calories => "CALORIAS (kcal)",
            Nutrient::Carbohydrates => "CARBOIDRATOS (g)",
            Nutrient::Protein => "PROTEINAS (g)",
            Nutrient::TotalFat => "GORDURAS_TOTAIS (g)",
            Nutrient::SaturatedFat => "GORDURAS_SATURADAS (g)",
            Nutrient::Fiber => "FIBRAS (g)",
            Nutrient::Sugars => "ACUCARES (g)",
            Nutrient::Sodium => "SODIO (mg)",
        }
    }
}

/// Label triggers, checked top to bottom; first hit wins.
///
/// No bare "gorduras" entry: it would also match saturated fat rows.
const LABEL_RULES: &[(&str, Nutrient)] = &[
    ("valor energético", Nutrient::Calories),
    ("calorias", Nutrient::Calories),
    ("carboidratos", Nutrient::Carbohydrates),
    ("proteínas", Nutrient::Protein),
    ("gorduras totais", Nutrient::TotalFat),
    ("gorduras saturadas", Nutrient::SaturatedFat),
    ("fibra alimentar", Nutrient::Fiber),
    ("fibra", Nutrient::Fiber),
    ("açúcares", Nutrient::Sugars),
    ("sódio", Nutrient::Sodium),
];

/// Map a table label to its nutrient, or `None` when nothing matches.
pub fn classify(label: &str) -> Option<Nutrient> {
    let label = label.to_lowercase();
    LABEL_RULES
        .iter()
        .find(|(phrase, _)| label.contains(phrase))
        .map(|(_, nutrient)| *nutrient)
}

/// Fixed-schema nutrition facts for one product, per 100 g.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NutrientRecord {
    pub portion_g: f64,
    pub calories_kcal: f64,
    pub carbohydrates_g: f64,
    pub protein_g: f64,
    pub total_fat_g: f64,
    pub saturated_fat_g: f64,
    pub fiber_g: f64,
    pub sugars_g: f64,
    pub sodium_mg: f64,
}

impl Default for NutrientRecord {
    fn default() -> Self {
        Self {
            portion_g: PORTION_G,
            calories_kcal: 0.0,
            carbohydrates_g: 0.0,
            protein_g: 0.0,
            total_fat_g: 0.0,
            saturated_fat_g: 0.0,
            fiber_g: 0.0,
            sugars_g: 0.0,
            sodium_mg: 0.0,
        }
    }
}

impl NutrientRecord {
    pub fn get(&self, nutrient: Nutrient) -> f64 {
        *self.field(nutrient)
    }

    /// Values in `Nutrient::ALL` order.
    pub fn values(&self) -> [f64; 9] {
        Nutrient::ALL.map(|n| self.get(n))
    }

    /// Build a record from (label, value) cell pairs. Later rows for the same
    /// nutrient overwrite earlier ones; unknown labels are skipped.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut record = Self::default();
        for (label, raw) in entries {
            if let Some(nutrient) = classify(label) {
                *record.field_mut(nutrient) = normalize(raw);
            }
        }
        record.portion_g = PORTION_G;
        record
    }

    fn field(&self, nutrient: Nutrient) -> &f64 {
        match nutrient {
            Nutrient::Portion => &self.portion_g,
            Nutrient::Calories => &self.calories_kcal,
            Nutrient::Carbohydrates => &self.carbohydrates_g,
            Nutrient::Protein => &self.protein_g,
            Nutrient::TotalFat => &self.total_fat_g,
            Nutrient::SaturatedFat => &self.saturated_fat_g,
            Nutrient::Fiber => &self.fiber_g,
            Nutrient::Sugars => &self.sugars_g,
            Nutrient::Sodium => &self.sodium_mg,
        }
    }

    fn field_mut(&mut self, nutrient: Nutrient) -> &mut f64 {
        match nutrient {
            Nutrient::Portion => &mut self.portion_g,
            Nutrient::Calories => &mut self.calories_kcal,
            Nutrient::Carbohydrates => &mut self.carbohydrates_g,
            Nutrient::Protein => &mut self.protein_g,
            Nutrient::TotalFat => &mut self.total_fat_g,
            Nutrient::SaturatedFat => &mut self.saturated_fat_g,
            Nutrient::Fiber => &mut self.fiber_g,
            Nutrient::Sugars => &mut self.sugars_g,
            Nutrient::Sodium => &mut self.sodium_mg,
        }
    }
}

/// Read every row of a nutrition `<table>` into (label, value) text pairs.
/// Rows with fewer than two cells are dropped; cells past the second are ignored.
pub fn table_entries(table: ElementRef) -> Vec<(String, String)> {
    table
        .select(&ROW_SEL)
        .filter_map(|row| {
            let mut cells = row.select(&CELL_SEL);
            let label = text_of(cells.next()?);
            let value = text_of(cells.next()?);
            Some((label, value))
        })
        .collect()
}

/// Nutrition facts from an optional table element. A missing table yields
/// the default record.
pub fn parse_table(table: Option<ElementRef>) -> NutrientRecord {
    let entries = table.map(table_entries).unwrap_or_default();
    NutrientRecord::from_entries(entries.iter().map(|(l, v)| (l.as_str(), v.as_str())))
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;

    fn parse_html_table(html: &str) -> NutrientRecord {
        let doc = Html::parse_fragment(html);
        let sel = Selector::parse("table").unwrap();
        parse_table(doc.select(&sel).next())
    }

    #[test]
    fn classify_known_labels() {
        assert_eq!(classify("Valor energético (kcal)"), Some(Nutrient::Calories));
        assert_eq!(classify("Calorias"), Some(Nutrient::Calories));
        assert_eq!(classify("Carboidratos (g)"), Some(Nutrient::Carbohydrates));
        assert_eq!(classify("Proteínas (g)"), Some(Nutrient::Protein));
        assert_eq!(classify("Gorduras totais (g)"), Some(Nutrient::TotalFat));
        assert_eq!(classify("Fibra alimentar (g)"), Some(Nutrient::Fiber));
        assert_eq!(classify("Açúcares totais (g)"), Some(Nutrient::Sugars));
        assert_eq!(classify("SÓDIO (mg)"), Some(Nutrient::Sodium));
    }

    #[test]
    fn saturated_fat_is_never_total_fat() {
        assert_eq!(classify("Gorduras Saturadas"), Some(Nutrient::SaturatedFat));
        assert_eq!(classify("gorduras saturadas (g)"), Some(Nutrient::SaturatedFat));
    }

    #[test]
    fn unknown_labels() {
        assert_eq!(classify("Gorduras trans (g)"), None);
        assert_eq!(classify("Cálcio"), None);
        assert_eq!(classify(""), None);
    }

    #[test]
    fn classify_is_stable() {
        for label in ["Sódio", "Gorduras Saturadas", "xyz", "Valor Energético"] {
            assert_eq!(classify(label), classify(label));
        }
    }

    #[test]
    fn portion_is_never_classified() {
        assert!(["Porção 100 g", "porcao", "Porção de referência"]
            .iter()
            .all(|l| classify(l) != Some(Nutrient::Portion)));
    }

    #[test]
    fn absent_or_empty_table_gives_defaults() {
        let rec = parse_table(None);
        assert_eq!(rec, NutrientRecord::default());
        assert_eq!(rec.portion_g, 100.0);
        assert!(rec.values()[1..].iter().all(|v| *v == 0.0));

        assert_eq!(parse_html_table("<table></table>"), NutrientRecord::default());
    }

    #[test]
    fn full_table() {
        let rec = parse_html_table(
            r#"<table>
                <tr><th>Porção 100 g</th><th>Quantidade</th><th>%VD</th></tr>
                <tr><td>Valor energético (kcal)</td><td>1.234,5</td><td>62</td></tr>
                <tr><td>Carboidratos (g)</td><td>12,0</td></tr>
                <tr><td>Proteínas (g)</td><td>18</td></tr>
                <tr><td>Gorduras totais (g)</td><td>9,1</td></tr>
                <tr><td>Gorduras saturadas (g)</td><td>3,2</td></tr>
                <tr><td>Gorduras trans (g)</td><td>0</td></tr>
                <tr><td>Fibra alimentar (g)</td><td>n/d</td></tr>
                <tr><td>Açúcares totais (g)</td><td>1,5/2</td></tr>
                <tr><td>Sódio (mg)</td><td>450</td></tr>
                <tr><td>nota de rodapé</td></tr>
            </table>"#,
        );
        assert_eq!(rec.portion_g, 100.0);
        assert_eq!(rec.calories_kcal, 1234.5);
        assert_eq!(rec.carbohydrates_g, 12.0);
        assert_eq!(rec.protein_g, 18.0);
        assert_eq!(rec.total_fat_g, 9.1);
        assert_eq!(rec.saturated_fat_g, 3.2);
        assert_eq!(rec.fiber_g, 0.0);
        assert_eq!(rec.sugars_g, 1.5);
        assert_eq!(rec.sodium_mg, 450.0);
    }

    #[test]
    fn later_row_overwrites_earlier() {
        let rec = NutrientRecord::from_entries([
            ("Valor energético (kJ)", "900"),
            ("Calorias (kcal)", "215"),
        ]);
        assert_eq!(rec.calories_kcal, 215.0);
    }

    #[test]
    fn stated_portion_is_ignored() {
        let rec = NutrientRecord::from_entries([("Porção (g)", "50"), ("Sódio", "10")]);
        assert_eq!(rec.portion_g, 100.0);
        assert_eq!(rec.sodium_mg, 10.0);
    }

    #[test]
    fn cell_text_is_trimmed_and_joined() {
        let rec = parse_html_table(
            "<table><tr><td> Sódio <small>(mg)</small> </td><td>\n 12,5 \n</td></tr></table>",
        );
        assert_eq!(rec.sodium_mg, 12.5);
    }
}
