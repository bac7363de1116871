//! Jeu de fichiers shapefile (shp, shx, dbf, prj, cpg)

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::CatastroError;

/// Extensions des fichiers annexes, dans l'ordre de téléchargement
pub const EXTENSIONS: [&str; 5] = ["shp", "shx", "dbf", "prj", "cpg"];

/// Contenu d'un jeu shapefile en mémoire
#[derive(Debug, Clone)]
pub struct ShapeSet {
    /// Nom de base commun aux fichiers (ex: "ABANILLA", "PARCELA")
    pub base_name: String,

    /// Géométries
    pub shp: Vec<u8>,

    /// Index des géométries
    pub shx: Vec<u8>,

    /// Attributs
    pub dbf: Vec<u8>,

    /// Projection (WKT), peut être vide
    pub prj: Vec<u8>,

    /// Encodage du .dbf, peut être vide
    pub cpg: Vec<u8>,
}

/// Jeu écrit sur disque, supprimé quand la valeur est détruite
#[derive(Debug)]
pub struct MaterializedSet {
    dir: TempDir,
    shp_path: PathBuf,
}

impl MaterializedSet {
    /// Chemin du .shp (les annexes sont à côté)
    pub fn shp_path(&self) -> &Path {
        &self.shp_path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

impl ShapeSet {
    /// Construit un jeu depuis des paires (extension, contenu)
    ///
    /// Les fichiers shp, shx et dbf sont obligatoires; prj et cpg peuvent manquer.
    pub fn from_parts(
        base_name: impl Into<String>,
        parts: impl IntoIterator<Item = (String, Vec<u8>)>,
    ) -> Result<Self, CatastroError> {
        let mut files: HashMap<String, Vec<u8>> = parts
            .into_iter()
            .map(|(ext, content)| (ext.trim_start_matches('.').to_lowercase(), content))
            .collect();

        let mut take_required = |ext: &str| {
            files
                .remove(ext)
                .ok_or_else(|| CatastroError::MissingFile(ext.to_uppercase()))
        };

        let shp = take_required("shp")?;
        let shx = take_required("shx")?;
        let dbf = take_required("dbf")?;

        Ok(Self {
            base_name: base_name.into(),
            shp,
            shx,
            dbf,
            prj: files.remove("prj").unwrap_or_default(),
            cpg: files.remove("cpg").unwrap_or_default(),
        })
    }

    /// Lit un jeu depuis un répertoire local (`{dir}/{base}.{ext}`)
    ///
    /// Point d'entrée pour les copies locales du cadastre; les jeux
    /// téléchargés passent par [`ShapeSet::from_parts`]. Les annexes absentes
    /// sont traitées comme dans `from_parts`.
    ///
    /// # Errors
    ///
    /// `CatastroError::MissingFile` si shp, shx ou dbf manque, `Io` si un
    /// fichier présent est illisible.
    pub fn read_dir(dir: &Path, base_name: &str) -> Result<Self, CatastroError> {
        let mut parts = Vec::with_capacity(EXTENSIONS.len());
        for ext in EXTENSIONS {
            let path = dir.join(format!("{}.{}", base_name, ext));
            if path.exists() {
                parts.push((ext.to_string(), std::fs::read(&path)?));
            }
        }
        Self::from_parts(base_name, parts)
    }

    /// Encodage déclaré par le .cpg (ex: "UTF-8"), s'il existe
    pub fn encoding_label(&self) -> Option<String> {
        let label = String::from_utf8_lossy(&self.cpg).trim().to_string();
        (!label.is_empty()).then_some(label)
    }

    /// Écrit le jeu dans un répertoire temporaire pour la lecture shapefile
    pub fn materialize(&self) -> Result<MaterializedSet, CatastroError> {
        let dir = tempfile::Builder::new().prefix("catastro-").tempdir()?;

        let contents: [(&str, &[u8]); 5] = [
            ("shp", &self.shp),
            ("shx", &self.shx),
            ("dbf", &self.dbf),
            ("prj", &self.prj),
            ("cpg", &self.cpg),
        ];

        for (ext, content) in contents {
            // prj/cpg vides: on n'écrit rien
            if content.is_empty() && matches!(ext, "prj" | "cpg") {
                continue;
            }
            let path = dir.path().join(format!("{}.{}", self.base_name, ext));
            std::fs::write(&path, content)?;
        }

        let shp_path = dir.path().join(format!("{}.shp", self.base_name));
        Ok(MaterializedSet { dir, shp_path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(ext: &str) -> (String, Vec<u8>) {
        (ext.to_string(), vec![1, 2, 3])
    }

    #[test]
    fn test_missing_dbf_is_an_error() {
        let result = ShapeSet::from_parts("ABANILLA", vec![part("shp"), part("shx")]);
        assert!(matches!(result, Err(CatastroError::MissingFile(f)) if f == "DBF"));
    }

    #[test]
    fn test_optional_parts_default_to_empty() {
        let set = ShapeSet::from_parts("X", vec![part(".SHP"), part("shx"), part("dbf")]).unwrap();
        assert!(set.prj.is_empty());
        assert_eq!(set.encoding_label(), None);
    }

    #[test]
    fn test_materialize_writes_sidecars() {
        let mut parts = vec![part("shp"), part("shx"), part("dbf")];
        parts.push(("cpg".to_string(), b"UTF-8\n".to_vec()));
        let set = ShapeSet::from_parts("PARCELA", parts).unwrap();
        assert_eq!(set.encoding_label().as_deref(), Some("UTF-8"));

        let materialized = set.materialize().unwrap();
        assert!(materialized.shp_path().exists());
        assert!(materialized.dir().join("PARCELA.dbf").exists());
        assert!(materialized.dir().join("PARCELA.cpg").exists());
        assert!(!materialized.dir().join("PARCELA.prj").exists());

        let dir = materialized.dir().to_path_buf();
        drop(materialized);
        assert!(!dir.exists());
    }

    #[test]
    fn test_read_dir_missing_directory() {
        let result = ShapeSet::read_dir(Path::new("nonexistent-dir"), "ABANILLA");
        assert!(result.is_err());
    }

    #[test]
    fn test_read_dir_without_optional_parts() {
        let dir = tempfile::tempdir().unwrap();
        for ext in ["shp", "shx", "dbf"] {
            std::fs::write(dir.path().join(format!("LORCA.{}", ext)), [7u8]).unwrap();
        }

        let set = ShapeSet::read_dir(dir.path(), "LORCA").unwrap();
        assert_eq!(set.base_name, "LORCA");
        assert_eq!(set.dbf, vec![7]);
        assert!(set.prj.is_empty());
        assert!(set.cpg.is_empty());
    }
}
