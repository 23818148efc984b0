use std::{fs, path::Path, path::PathBuf};

use tracing::{debug, info};

use crate::apps::MapReduceApp;
use crate::error::Result;
use crate::shuffle::{self, KeyValue};

/* =========================
   Ejecución de tareas
   ========================= */

/// Ejecuta una tarea map:
///
/// 1. Lee el archivo de entrada completo.
/// 2. Aplica la función map del usuario.
/// 3. Publica las `n_reduce` particiones en `work_dir`.
///
/// Cualquier error de I/O se devuelve tal cual: para el worker es fatal.
pub fn run_map(
    app: &MapReduceApp,
    index: u32,
    file_name: &str,
    n_reduce: u32,
    work_dir: &Path,
) -> Result<usize> {
    // bytes crudos: un archivo que no es UTF-8 válido no es un error de I/O
    let bytes = fs::read(file_name)?;
    let contents = String::from_utf8_lossy(&bytes);
    let records = (app.map)(file_name, &contents);
    debug!(
        "map {} ({}) generó {} registros",
        index,
        file_name,
        records.len()
    );

    shuffle::publish(work_dir, index, &records, n_reduce)?;
    Ok(records.len())
}

/// Agrupa registros ordenados por clave y aplica `reduce` a cada grupo.
/// El resultado queda en orden ascendente de clave.
pub fn reduce_sorted<F>(mut records: Vec<KeyValue>, reduce: F) -> Vec<(String, String)>
where
    F: Fn(&str, &[String]) -> String,
{
    records.sort_by(|a, b| a.key.cmp(&b.key));

    let mut out = Vec::new();
    let mut iter = records.into_iter().peekable();
    while let Some(first) = iter.next() {
        let key = first.key;
        let mut values = vec![first.value];
        while let Some(next) = iter.next_if(|kv| kv.key == key) {
            values.push(next.value);
        }
        let reduced = reduce(&key, &values);
        out.push((key, reduced));
    }
    out
}

/// Ejecuta una tarea reduce:
///
/// 1. Junta los registros de su partición de todas las tareas map.
/// 2. Ordena por clave, agrupa y aplica la función reduce del usuario.
/// 3. Escribe `mr-out-<index>` con una línea "clave valor" por clave distinta.
pub fn run_reduce(app: &MapReduceApp, index: u32, work_dir: &Path) -> Result<PathBuf> {
    let records = shuffle::collect(work_dir, index)?;
    let n_records = records.len();

    let results = reduce_sorted(records, |k, vs| (app.reduce)(k, vs));
    let path = shuffle::write_output(work_dir, index, &results)?;

    info!(
        "reduce {}: {} registros, {} claves -> {}",
        index,
        n_records,
        results.len(),
        path.display()
    );
    Ok(path)
}
