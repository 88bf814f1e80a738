/// Settings the database actor is spawned with.
#[derive(Debug, Clone)]
pub struct DbOptions {
    pub database_url: String,
    pub seed_demo_data: bool,
    pub csv_filename: String,
    pub snapshot_filename: String,
}

impl DbOptions {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            seed_demo_data: false,
            csv_filename: "lab_audit.csv".to_string(),
            snapshot_filename: "lab_assets.db".to_string(),
        }
    }

    pub fn seed_demo_data(mut self, seed: bool) -> Self {
        self.seed_demo_data = seed;
        self
    }

    pub fn csv_filename(mut self, filename: impl Into<String>) -> Self {
        self.csv_filename = filename.into();
        self
    }

    pub fn snapshot_filename(mut self, filename: impl Into<String>) -> Self {
        self.snapshot_filename = filename.into();
        self
    }
}
