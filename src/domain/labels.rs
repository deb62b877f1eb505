/// Immutable internal-label → display-name table. Labels with no entry
/// are shown as-is. Entries keep the order they were given in.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    entries: Vec<(String, String)>,
}

impl LabelTable {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut table: Vec<(String, String)> = Vec::new();
        for (k, v) in entries {
            let (k, v) = (k.into(), v.into());
            // later duplicates replace the earlier mapping in place
            match table.iter_mut().find(|(key, _)| *key == k) {
                Some(slot) => slot.1 = v,
                None => table.push((k, v)),
            }
        }
        Self { entries: table }
    }

    /// The four roadside flowers the demo model is trained on.
    pub fn taiwan_flowers() -> Self {
        Self::new([
            ("Bidens", "鬼針草(大花咸豐草)"),
            ("Frangipani", "雞蛋花"),
            ("Periwinkle", "日日春"),
            ("Lantana", "馬櫻丹"),
        ])
    }

    pub fn display_name<'a>(&'a self, label: &'a str) -> &'a str {
        self.entries
            .iter()
            .find(|(k, _)| k == label)
            .map(|(_, v)| v.as_str())
            .unwrap_or(label)
    }

    /// Display names in table order, for the page header.
    pub fn display_names(&self) -> Vec<String> {
        self.entries.iter().map(|(_, v)| v.clone()).collect()
    }
}
