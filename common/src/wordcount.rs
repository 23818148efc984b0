use crate::shuffle::KeyValue;

/// Normaliza un token: sólo alfanumérico y '_', en minúscula.
pub fn normalize_token(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect::<String>()
        .to_lowercase()
}

/// Tokens de un texto, ya normalizados y sin vacíos.
pub fn tokens(contents: &str) -> impl Iterator<Item = String> + '_ {
    contents
        .split_whitespace()
        .map(normalize_token)
        .filter(|t| !t.is_empty())
}

/// map: emite (palabra, "1") por cada aparición.
pub fn map(_document: &str, contents: &str) -> Vec<KeyValue> {
    tokens(contents).map(|t| KeyValue::new(t, "1")).collect()
}

/// reduce: cantidad de apariciones.
pub fn reduce(_key: &str, values: &[String]) -> String {
    values.len().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_normaliza_y_emite_uno_por_palabra() {
        let kvs = map("doc.txt", "Hola hola, mundo!!\nmundo   mundo_prueba");
        let keys: Vec<&str> = kvs.iter().map(|kv| kv.key.as_str()).collect();

        assert_eq!(keys, vec!["hola", "hola", "mundo", "mundo", "mundo_prueba"]);
        assert!(kvs.iter().all(|kv| kv.value == "1"));
    }

    #[test]
    fn map_de_texto_vacio_no_emite_nada() {
        assert!(map("vacio.txt", "").is_empty());
        assert!(map("signos.txt", "!! ?? ...").is_empty());
    }

    #[test]
    fn reduce_cuenta_valores() {
        let values = vec!["1".to_string(); 3];
        assert_eq!(reduce("hola", &values), "3");
    }
}
