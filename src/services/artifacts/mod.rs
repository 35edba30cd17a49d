use crate::config::ModelPathsConfig;
use crate::data_store::{DataStore, DataStoreError, MultiMatrix};
use crate::services::rating::{self, RatingError};
use ndarray::Array2;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::info;

/// Any artifact problem is fatal for the serving instance: the process must
/// fail fast at startup rather than serve from a partial model.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("data store error: {0}")]
    Store(#[from] DataStoreError),

    #[error("rating file error: {0}")]
    Rating(#[from] RatingError),

    #[error("loaded matrix dict is empty")]
    EmptyModel,

    #[error("matrix {name} has ragged rows")]
    RaggedMatrix { name: &'static str },

    #[error("matrix {name} has {actual} latent factors, expected {expected}")]
    DimensionMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("corrupt package catalog: {0}")]
    CorruptCatalog(String),

    #[error("{what}: expected {expected} rows, found {actual}")]
    Misaligned {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{what} references id {id}, upper bound is {bound}")]
    IdOutOfRange {
        what: &'static str,
        id: usize,
        bound: usize,
    },
}

pub type Result<T> = std::result::Result<T, ArtifactError>;

/// Bijective package-name <-> dense-id mapping. Ids are contiguous in
/// `[0, N)`, fixed for the lifetime of one model version.
#[derive(Debug, Clone)]
pub struct PackageCatalog {
    name_to_id: HashMap<String, usize>,
    id_to_name: Vec<String>,
}

impl PackageCatalog {
    pub fn from_maps(
        name_to_id: HashMap<String, usize>,
        id_to_name_map: &HashMap<String, String>,
    ) -> Result<Self> {
        let n = name_to_id.len();
        if id_to_name_map.len() != n {
            return Err(ArtifactError::CorruptCatalog(format!(
                "forward map has {} entries, inverse has {}",
                n,
                id_to_name_map.len()
            )));
        }

        let mut id_to_name = vec![String::new(); n];
        let mut seen = vec![false; n];
        for (id_str, name) in id_to_name_map {
            let id: usize = id_str.parse().map_err(|_| {
                ArtifactError::CorruptCatalog(format!("non-numeric id key {:?}", id_str))
            })?;
            if id >= n {
                return Err(ArtifactError::CorruptCatalog(format!(
                    "id {} outside contiguous range [0, {})",
                    id, n
                )));
            }
            if seen[id] {
                return Err(ArtifactError::CorruptCatalog(format!("duplicate id {}", id)));
            }
            seen[id] = true;
            id_to_name[id] = name.clone();
        }

        for (name, &id) in &name_to_id {
            if id >= n || id_to_name[id] != *name {
                return Err(ArtifactError::CorruptCatalog(format!(
                    "maps disagree on package {:?}",
                    name
                )));
            }
        }

        Ok(Self {
            name_to_id,
            id_to_name,
        })
    }

    pub fn id_of(&self, name: &str) -> Option<usize> {
        self.name_to_id.get(name).copied()
    }

    pub fn name_of(&self, id: usize) -> Option<&str> {
        self.id_to_name.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.id_to_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_name.is_empty()
    }
}

/// Everything the serving path needs, loaded once per process and immutable
/// afterwards. A new model version means a fresh load, never a mutation.
pub struct ModelArtifacts {
    /// M x D latent vectors of the historical training users (`m_U`).
    pub user_matrix: Array2<f64>,
    /// N x D latent item embeddings (`m_V`).
    pub item_matrix: Array2<f64>,
    /// N x K content-derived item representation (`m_theta`); the training
    /// prior, retained as part of the multi-matrix contract.
    pub weight_matrix: Array2<f64>,
    pub catalog: PackageCatalog,
    pub package_tag_map: HashMap<String, Vec<String>>,
    /// Row-aligned with `user_matrix`.
    pub precomputed_stacks: Vec<HashSet<usize>>,
    /// For each item id, the training users that included it. Row-aligned
    /// with `item_matrix`.
    pub item_user_sets: Vec<HashSet<usize>>,
}

impl ModelArtifacts {
    /// Load and validate every artifact from the store. Any missing or
    /// malformed file aborts the load; there is no partial operation.
    pub async fn load(
        store: &dyn DataStore,
        paths: &ModelPathsConfig,
        num_latent: usize,
    ) -> Result<Self> {
        info!(store = %store.name(), "Loading model artifacts");

        let multi_matrix = store.load_multi_matrix(&paths.pmf_model_path).await?;
        if multi_matrix.is_empty() {
            return Err(ArtifactError::EmptyModel);
        }

        let MultiMatrix { m_u, m_v, m_theta } = multi_matrix;
        let user_matrix = matrix_from_rows("m_U", m_u)?;
        let item_matrix = matrix_from_rows("m_V", m_v)?;
        let weight_matrix = matrix_from_rows("m_theta", m_theta)?;

        for (name, matrix) in [("m_U", &user_matrix), ("m_V", &item_matrix)] {
            if matrix.ncols() != num_latent {
                return Err(ArtifactError::DimensionMismatch {
                    name,
                    expected: num_latent,
                    actual: matrix.ncols(),
                });
            }
        }

        let name_to_id: HashMap<String, usize> =
            serde_json::from_value(store.read_json_file(&paths.package_to_id_map).await?)
                .map_err(|e| ArtifactError::CorruptCatalog(e.to_string()))?;
        let id_to_name: HashMap<String, String> =
            serde_json::from_value(store.read_json_file(&paths.id_to_package_map).await?)
                .map_err(|e| ArtifactError::CorruptCatalog(e.to_string()))?;
        let catalog = PackageCatalog::from_maps(name_to_id, &id_to_name)?;

        if catalog.len() != item_matrix.nrows() {
            return Err(ArtifactError::Misaligned {
                what: "package catalog vs item matrix",
                expected: item_matrix.nrows(),
                actual: catalog.len(),
            });
        }

        let package_tag_map: HashMap<String, Vec<String>> =
            serde_json::from_value(store.read_json_file(&paths.package_tag_map).await?)
                .map_err(|e| ArtifactError::CorruptCatalog(e.to_string()))?;

        let stack_bytes = store.read_generic_file(&paths.precomputed_stacks).await?;
        let precomputed_stacks = rating::parse_rating_file(&stack_bytes)?;
        if precomputed_stacks.len() != user_matrix.nrows() {
            return Err(ArtifactError::Misaligned {
                what: "precomputed stacks vs user matrix",
                expected: user_matrix.nrows(),
                actual: precomputed_stacks.len(),
            });
        }
        validate_id_bound(
            "precomputed stack",
            &precomputed_stacks,
            item_matrix.nrows(),
        )?;

        let item_bytes = store.read_generic_file(&paths.training_data_items).await?;
        let item_user_sets = rating::parse_rating_file(&item_bytes)?;
        if item_user_sets.len() != item_matrix.nrows() {
            return Err(ArtifactError::Misaligned {
                what: "item-to-user mapping vs item matrix",
                expected: item_matrix.nrows(),
                actual: item_user_sets.len(),
            });
        }
        validate_id_bound("item-to-user mapping", &item_user_sets, user_matrix.nrows())?;

        info!(
            packages = catalog.len(),
            training_users = user_matrix.nrows(),
            latent_factors = item_matrix.ncols(),
            "Model artifacts loaded"
        );

        Ok(Self {
            user_matrix,
            item_matrix,
            weight_matrix,
            catalog,
            package_tag_map,
            precomputed_stacks,
            item_user_sets,
        })
    }
}

fn matrix_from_rows(name: &'static str, rows: Vec<Vec<f64>>) -> Result<Array2<f64>> {
    let nrows = rows.len();
    let ncols = rows.first().map(Vec::len).unwrap_or(0);

    let mut flat = Vec::with_capacity(nrows * ncols);
    for row in &rows {
        if row.len() != ncols {
            return Err(ArtifactError::RaggedMatrix { name });
        }
        flat.extend_from_slice(row);
    }

    Array2::from_shape_vec((nrows, ncols), flat)
        .map_err(|_| ArtifactError::RaggedMatrix { name })
}

fn validate_id_bound(
    what: &'static str,
    rows: &[HashSet<usize>],
    bound: usize,
) -> Result<()> {
    for row in rows {
        if let Some(&id) = row.iter().find(|&&id| id >= bound) {
            return Err(ArtifactError::IdOutOfRange { what, id, bound });
        }
    }
    Ok(())
}
