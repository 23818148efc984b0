use std::collections::BTreeSet;

use crate::shuffle::KeyValue;
use crate::wordcount::tokens;

/// map: (palabra, documento) una vez por palabra distinta del documento.
pub fn map(document: &str, contents: &str) -> Vec<KeyValue> {
    let words: BTreeSet<String> = tokens(contents).collect();
    words
        .into_iter()
        .map(|w| KeyValue::new(w, document))
        .collect()
}

/// reduce: "<n> doc1,doc2,..." con documentos ordenados y sin repetir.
pub fn reduce(_key: &str, values: &[String]) -> String {
    let docs: BTreeSet<&str> = values.iter().map(String::as_str).collect();
    let list: Vec<&str> = docs.into_iter().collect();
    format!("{} {}", list.len(), list.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_emite_cada_palabra_una_vez_por_documento() {
        let kvs = map("a.txt", "uno dos uno");
        assert_eq!(
            kvs,
            vec![KeyValue::new("dos", "a.txt"), KeyValue::new("uno", "a.txt")]
        );
    }

    #[test]
    fn reduce_ordena_y_deduplica_documentos() {
        let values = vec!["b.txt".to_string(), "a.txt".to_string(), "b.txt".to_string()];
        assert_eq!(reduce("uno", &values), "2 a.txt,b.txt");
    }
}
