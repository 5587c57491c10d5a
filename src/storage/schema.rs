//! Database schema definitions

/// SQL to create the legacy single-document table
pub const CREATE_RESUME_DATA_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS resume_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    data TEXT NOT NULL,
    updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
)
"#;

/// SQL to create the profiles table
pub const CREATE_PROFILES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS profiles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    data TEXT NOT NULL,
    template TEXT DEFAULT 'modern',
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_profiles_updated_at ON profiles(updated_at)",
    "CREATE INDEX IF NOT EXISTS idx_resume_data_updated_at ON resume_data(updated_at)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_RESUME_DATA_TABLE, CREATE_PROFILES_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
