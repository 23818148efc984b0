use std::{
    fs::{self, File},
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use glob::{glob, Pattern};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MrError, Result};

/// Par clave/valor que emite una función map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/* =========================
   Particionado
   ========================= */

/// FNV-1a de 32 bits, estable entre procesos y versiones del compilador.
pub fn ihash(key: &str) -> u32 {
    let mut h: u32 = 0x811c_9dc5;
    for b in key.as_bytes() {
        h ^= u32::from(*b);
        h = h.wrapping_mul(0x0100_0193);
    }
    h & 0x7fff_ffff
}

pub fn partition_for(key: &str, n_reduce: u32) -> u32 {
    ihash(key) % n_reduce
}

/* =========================
   Nombres de archivo
   ========================= */

pub fn intermediate_path(dir: &Path, reduce: u32, map: u32) -> PathBuf {
    dir.join(format!("mr-int-{}-{}", reduce, map))
}

pub fn output_path(dir: &Path, reduce: u32) -> PathBuf {
    dir.join(format!("mr-out-{}", reduce))
}

/// Nombre privado de un intento: nadie más escribe ni lee aquí.
fn temp_path(dir: &Path, attempt: &str, suffix: &str) -> PathBuf {
    dir.join(format!("mr-tmp-{}-{}", attempt, suffix))
}

fn new_attempt_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Escribe con `write` en un nombre temporal y lo renombra a `final_path`.
/// El rename es el punto en que el contenido se vuelve visible.
fn write_atomically<F>(final_path: &Path, tmp_path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let result = write_and_rename(final_path, tmp_path, write);
    if result.is_err() {
        let _ = fs::remove_file(tmp_path);
    }
    result
}

fn write_and_rename<F>(final_path: &Path, tmp_path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let mut writer = BufWriter::new(File::create(tmp_path)?);
    write(&mut writer)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    fs::rename(tmp_path, final_path)?;
    Ok(())
}

/* =========================
   Shuffle: publish / collect
   ========================= */

/// Reparte los registros de la tarea map `map_index` en `n_reduce` particiones
/// y las publica con rename atómico.
///
/// Siempre se publican las `n_reduce` particiones (vacías incluidas), cada una
/// reescrita desde cero: un reintento sobreescribe, nunca agrega.
pub fn publish(dir: &Path, map_index: u32, records: &[KeyValue], n_reduce: u32) -> Result<()> {
    if n_reduce == 0 {
        return Err(MrError::InvalidJob("n_reduce debe ser >= 1".to_string()));
    }
    fs::create_dir_all(dir)?;

    let mut buckets: Vec<Vec<&KeyValue>> = vec![Vec::new(); n_reduce as usize];
    for kv in records {
        buckets[partition_for(&kv.key, n_reduce) as usize].push(kv);
    }

    let attempt = new_attempt_token();
    for (reduce, bucket) in buckets.iter().enumerate() {
        let reduce = reduce as u32;
        let tmp = temp_path(dir, &attempt, &format!("{}-{}", reduce, map_index));
        let dest = intermediate_path(dir, reduce, map_index);

        write_atomically(&dest, &tmp, |w| {
            for kv in bucket {
                serde_json::to_writer(&mut *w, kv)?;
                w.write_all(b"\n")?;
            }
            Ok(())
        })?;
    }

    debug!(
        "map {} publicó {} registros en {} particiones (intento {})",
        map_index,
        records.len(),
        n_reduce,
        attempt
    );
    Ok(())
}

/// Lee un archivo intermedio (JSONL, un KeyValue por línea).
pub fn read_intermediate(path: &Path) -> Result<Vec<KeyValue>> {
    let reader = BufReader::new(File::open(path)?);

    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        out.push(serde_json::from_str(&line)?);
    }
    Ok(out)
}

/// Archivos publicados para la partición `reduce`, ordenados por índice de map.
pub fn intermediate_files(dir: &Path, reduce: u32) -> Result<Vec<(u32, PathBuf)>> {
    let prefix = format!("mr-int-{}-", reduce);
    let pattern = format!(
        "{}/{}*",
        Pattern::escape(&dir.to_string_lossy()),
        prefix
    );

    let entries = glob(&pattern).map_err(|e| MrError::InvalidJob(e.to_string()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| MrError::Io(e.into_error()))?;
        // "mr-int-1-" no debe confundirse con "mr-int-12-": el resto tiene que ser un número
        let map_index = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(&prefix))
            .and_then(|rest| rest.parse::<u32>().ok());
        if let Some(map_index) = map_index {
            files.push((map_index, path));
        }
    }
    files.sort_by_key(|(m, _)| *m);
    Ok(files)
}

/// Junta los registros de todas las tareas map para la partición `reduce`.
pub fn collect(dir: &Path, reduce: u32) -> Result<Vec<KeyValue>> {
    let mut out = Vec::new();
    for (_, path) in intermediate_files(dir, reduce)? {
        out.extend(read_intermediate(&path)?);
    }
    Ok(out)
}

/// Escribe la salida final "key valor" de una tarea reduce, también con
/// publicación atómica.
pub fn write_output(dir: &Path, reduce: u32, results: &[(String, String)]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let dest = output_path(dir, reduce);
    let tmp = temp_path(dir, &new_attempt_token(), &format!("out-{}", reduce));

    write_atomically(&dest, &tmp, |w| {
        for (key, value) in results {
            writeln!(w, "{} {}", key, value)?;
        }
        Ok(())
    })?;
    Ok(dest)
}
