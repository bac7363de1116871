//! Parsers des fichiers du jeu shapefile

pub mod dbf;
pub mod prj;
pub mod shp;
