//! Column-name constants and fixed positional offsets for the survey workbook.
//!
//! Raw sheets are positional: meaning comes from column order, never from the
//! header text. Every offset the normalizers rely on lives here.

// ── Raw workbook ────────────────────────────────────────────────────────────
pub mod sheets {
    pub const SPECIES: &str = "ESPECES";
    pub const GPS: &str = "GPS-MILIEU";
    pub const OBSERVATIONS: &str = "NOM FRANÇAIS";

    /// Sheet name → raw CSV export filename.
    pub const RAW_FILES: [(&str, &str); 3] = [
        (SPECIES, "especes.csv"),
        (GPS, "gps_milieu.csv"),
        (OBSERVATIONS, "observations.csv"),
    ];

    /// Sheet name → normalized CSV filename.
    pub const CLEAN_FILES: [(&str, &str); 3] = [
        (SPECIES, "especes_clean.csv"),
        (GPS, "gps_milieu_clean.csv"),
        (OBSERVATIONS, "observations_clean.csv"),
    ];
}

// ── Species sheet ───────────────────────────────────────────────────────────
pub mod species {
    /// Leading empty filler columns.
    pub const FILLER_COLUMNS: usize = 2;

    pub const ESPECIES_NAME: &str = "ESPECIES_NAME";
    pub const LATIN_NAME: &str = "LATIN_NAME";
    pub const NATURE: &str = "NATURE";

    pub const ALL: [&str; 3] = [ESPECIES_NAME, LATIN_NAME, NATURE];
}

// ── GPS / habitat sheet ─────────────────────────────────────────────────────
pub mod gps {
    pub const FILLER_COLUMNS: usize = 2;
    /// Label row sitting above the real data once the header is consumed.
    pub const FILLER_ROWS: usize = 1;

    pub const TRANSECT_NAME: &str = "TRANSECT_NAME";
    pub const COORDINATE_X: &str = "COORDINATE_X";
    pub const COORDINATE_Y: &str = "COORDINATE_Y";
    pub const HABITAT_TYPE: &str = "HABITAT_TYPE";
    pub const TRANSECT_ID: &str = "TRANSECT_ID";
    pub const POINT_ID: &str = "POINT_ID";

    pub const ALL: [&str; 6] = [
        TRANSECT_NAME,
        COORDINATE_X,
        COORDINATE_Y,
        HABITAT_TYPE,
        TRANSECT_ID,
        POINT_ID,
    ];
}

// ── Observation sheet ───────────────────────────────────────────────────────
pub mod observations {
    /// Header/filler rows left over from the workbook read.
    pub const FILLER_ROWS: usize = 2;
    /// Visit metadata columns preceding the count block.
    pub const METADATA_COLUMNS: usize = 12;
    /// Count block spans [COUNT_START, COUNT_END).
    pub const COUNT_START: usize = METADATA_COLUMNS;
    pub const COUNT_END: usize = COUNT_START + COUNT_FIELDS.len();

    pub const PASSAGE_RAW: &str = "1er, 2e ou 3e passage";
    pub const PASSAGE: &str = "N° passage";

    pub const AL25: &str = "AL25";
    pub const VL25: &str = "VL25";
    pub const AL50: &str = "AL50";
    pub const VL50: &str = "VL50";
    pub const AL100: &str = "AL100";
    pub const VL100: &str = "VL100";
    pub const AG100: &str = "AG100";
    pub const VG100: &str = "VG100";
    pub const VOL: &str = "VOL";
    pub const TOT_A: &str = "TOT_A";
    pub const TOT_V_SV: &str = "TOT_V_sV";
    pub const TOT_AV_SV: &str = "TOT_AV_sV";
    pub const TOT_AV_V: &str = "TOT_AV_V";
    pub const COMPANIED: &str = "COMPANIED";

    pub const COUNT_FIELDS: [&str; 14] = [
        AL25, VL25, AL50, VL50, AL100, VL100, AG100, VG100, VOL, TOT_A, TOT_V_SV, TOT_AV_SV,
        TOT_AV_V, COMPANIED,
    ];

    /// Count fields coerced to integers (everything except COMPANIED).
    pub const INTEGER_FIELDS: [&str; 13] = [
        AL25, VL25, AL50, VL50, AL100, VL100, AG100, VG100, VOL, TOT_A, TOT_V_SV, TOT_AV_SV,
        TOT_AV_V,
    ];
}

// ── Derived detection table ─────────────────────────────────────────────────
pub mod detection {
    pub const SPECIES: &str = "species";
    pub const TRANSECT: &str = "transect";
    pub const YEAR: &str = "year";
    pub const K_DETECTS: &str = "K_detects";
    pub const N_VISITS: &str = "N_visits";
    pub const DET_RATE: &str = "det_rate";
}

// ── Trend / prediction outputs ──────────────────────────────────────────────
pub mod trend {
    pub const FITTED: &str = "fitted";
    pub const CI_LOW: &str = "ci_low";
    pub const CI_HIGH: &str = "ci_high";
    pub const SLOPE: &str = "slope";
    pub const P_VALUE: &str = "p_value";
    pub const N_ROWS: &str = "n_rows";
}
