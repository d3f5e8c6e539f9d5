//! Recognise the aircraft this connector supports.

use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToLissModel {
    A319,
    A321,
    A340,
}

impl ToLissModel {
    /// Detect from the aircraft file name, e.g. `a321_StdDef.acf`.
    pub fn detect(acf_file: &str) -> Option<Self> {
        let prefix: String = acf_file.chars().take(4).collect::<String>().to_ascii_uppercase();
        match prefix.as_str() {
            "A319" => Some(Self::A319),
            "A321" => Some(Self::A321),
            "A340" => Some(Self::A340),
            _ => None,
        }
    }
}

/// ToLiss aircraft keep their data under this path of the simulator root.
pub fn is_toliss_install(system_dir: &Path) -> bool {
    system_dir
        .join("Resources")
        .join("plugins")
        .join("ToLissData")
        .join("Situations")
        .is_dir()
}
