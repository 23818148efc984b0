use std::{fmt, sync::Arc};

use crate::error::{MrError, Result};
use crate::shuffle::KeyValue;
use crate::{indexer, wordcount};

/// Función map externa: (nombre del documento, contenido) -> registros.
pub type MapFn = Arc<dyn Fn(&str, &str) -> Vec<KeyValue> + Send + Sync>;
/// Función reduce externa: (clave, todos sus valores) -> valor reducido.
pub type ReduceFn = Arc<dyn Fn(&str, &[String]) -> String + Send + Sync>;

/// Par de funciones de usuario que ejecuta un worker.
#[derive(Clone)]
pub struct MapReduceApp {
    pub name: String,
    pub map: MapFn,
    pub reduce: ReduceFn,
}

impl MapReduceApp {
    pub fn new<M, R>(name: &str, map: M, reduce: R) -> Self
    where
        M: Fn(&str, &str) -> Vec<KeyValue> + Send + Sync + 'static,
        R: Fn(&str, &[String]) -> String + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            map: Arc::new(map),
            reduce: Arc::new(reduce),
        }
    }
}

impl fmt::Debug for MapReduceApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapReduceApp")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

pub const APP_NAMES: &[&str] = &["wordcount", "indexer"];

/// Busca una de las aplicaciones incluidas por nombre.
pub fn lookup(name: &str) -> Result<MapReduceApp> {
    match name {
        "wordcount" => Ok(MapReduceApp::new(name, wordcount::map, wordcount::reduce)),
        "indexer" => Ok(MapReduceApp::new(name, indexer::map, indexer::reduce)),
        other => Err(MrError::UnknownApp(other.to_string())),
    }
}
