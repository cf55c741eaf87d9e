use std::path::{Path, PathBuf};

use sqlx::{ColumnIndex, Database, Decode, Executor, IntoArguments, Pool, Row, Type};
use vecprep_core::{Document, Value};

use crate::params::LoaderSource;
use crate::sql::{classify, quote_identifier};
use crate::IngestionError;

/// Loads documents from a table column, a single file, or a directory tree.
///
/// The pool is only touched for [`LoaderSource::Table`]; filesystem sources
/// are read locally.
pub struct DocLoader<DB: Database> {
    pool: Pool<DB>,
    source: LoaderSource,
}

impl<DB> DocLoader<DB>
where
    DB: Database,
    for<'q> DB::Arguments<'q>: IntoArguments<'q, DB>,
    for<'c> &'c Pool<DB>: Executor<'c, Database = DB>,
    for<'r> Option<String>: Decode<'r, DB> + Type<DB>,
    usize: ColumnIndex<DB::Row>,
{
    pub fn new(pool: Pool<DB>, source: LoaderSource) -> Result<Self, IngestionError> {
        source.validate()?;
        Ok(Self { pool, source })
    }

    pub fn from_params(pool: Pool<DB>, params: &Value) -> Result<Self, IngestionError> {
        let source = LoaderSource::from_value(params)?;
        Ok(Self { pool, source })
    }

    pub fn source(&self) -> &LoaderSource {
        &self.source
    }

    pub async fn load(&self) -> Result<Vec<Document>, IngestionError> {
        match &self.source {
            LoaderSource::Table {
                owner,
                table,
                column,
            } => self.load_table(owner, table, column).await,
            LoaderSource::File(path) => {
                let metadata = tokio::fs::metadata(path)
                    .await
                    .map_err(|err| IngestionError::io(path, err))?;
                if metadata.is_dir() {
                    return Err(IngestionError::Configuration(format!(
                        "{} is a directory; use a dir source",
                        path.display()
                    )));
                }
                Ok(vec![load_file(path).await?])
            }
            LoaderSource::Dir(path) => load_dir(path).await,
        }
    }

    async fn load_table(
        &self,
        owner: &str,
        table: &str,
        column: &str,
    ) -> Result<Vec<Document>, IngestionError> {
        let object = format!("{owner}.{table}");
        let statement = format!(
            "SELECT {} FROM {}.{}",
            quote_identifier(column),
            quote_identifier(owner),
            quote_identifier(table)
        );
        tracing::debug!(%statement, "loading documents from table");

        let rows = self
            .pool
            .fetch_all(sqlx::query::<DB>(&statement))
            .await
            .map_err(|err| classify(err, &object))?;

        let mut documents = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            let content = row
                .try_get::<Option<String>, usize>(0)
                .map_err(|err| classify(err, &object))?
                .unwrap_or_default();
            documents.push(
                Document::new(format!("{object}.{column}#{index}"), content)
                    .with_metadata("source", format!("{object}.{column}"))
                    .with_metadata("owner", owner)
                    .with_metadata("table", table)
                    .with_metadata("column", column)
                    .with_metadata("row", index),
            );
        }

        tracing::debug!(table = %object, documents = documents.len(), "loaded table rows");
        Ok(documents)
    }
}

async fn load_dir(root: &Path) -> Result<Vec<Document>, IngestionError> {
    let metadata = tokio::fs::metadata(root)
        .await
        .map_err(|err| IngestionError::io(root, err))?;
    if !metadata.is_dir() {
        return Err(IngestionError::Configuration(format!(
            "{} is not a directory; use a file source",
            root.display()
        )));
    }

    let files = collect_files(root).await?;
    let mut documents = Vec::with_capacity(files.len());
    for path in &files {
        documents.push(load_file(path).await?);
    }
    tracing::debug!(dir = %root.display(), documents = documents.len(), "loaded directory");
    Ok(documents)
}

/// Regular files under `root`, recursively, sorted by path. Symlinked
/// directories are skipped so cycles cannot occur.
async fn collect_files(root: &Path) -> Result<Vec<PathBuf>, IngestionError> {
    let mut pending = vec![root.to_path_buf()];
    let mut files = Vec::new();

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|err| IngestionError::io(&dir, err))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| IngestionError::io(&dir, err))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|err| IngestionError::io(&path, err))?;

            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() {
                files.push(path);
            } else if file_type.is_symlink() {
                match tokio::fs::metadata(&path).await {
                    Ok(target) if target.is_file() => files.push(path),
                    Ok(_) => tracing::debug!(path = %path.display(), "skipping symlinked directory"),
                    Err(err) => {
                        tracing::warn!(path = %path.display(), error = %err, "skipping broken symlink")
                    }
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

async fn load_file(path: &Path) -> Result<Document, IngestionError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| IngestionError::io(path, err))?;
    let content = extract_text(path, &bytes)?;

    let source = path.to_string_lossy().to_string();
    let mut document = Document::new(source.clone(), content).with_metadata("source", source);
    if let Some(name) = path.file_name() {
        document = document.with_metadata("file_name", name.to_string_lossy().to_string());
    }
    Ok(document)
}

#[cfg(feature = "pdf")]
fn extract_text(path: &Path, bytes: &[u8]) -> Result<String, IngestionError> {
    let is_pdf = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if is_pdf {
        return pdf_extract::extract_text_from_mem(bytes).map_err(|err| IngestionError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        });
    }
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

#[cfg(not(feature = "pdf"))]
fn extract_text(_path: &Path, bytes: &[u8]) -> Result<String, IngestionError> {
    Ok(String::from_utf8_lossy(bytes).into_owned())
}
