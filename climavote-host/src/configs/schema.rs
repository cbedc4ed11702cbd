use crate::models::{FeedbackTable, SensorSampleTable, Table, UserTable, VoteTable};

pub struct SchemaManager {
    tables: Vec<Box<dyn Table>>,
}

impl SchemaManager {
    pub fn new(mut tables: Vec<Box<dyn Table>>) -> Self {
        Self::sort_tables(&mut tables);
        Self { tables }
    }

    /// Orders tables so that every table follows the tables it references.
    fn sort_tables(tables: &mut Vec<Box<dyn Table>>) {
        let mut pending = std::mem::take(tables);
        let mut sorted: Vec<Box<dyn Table>> = Vec::with_capacity(pending.len());

        while !pending.is_empty() {
            let ready = pending.iter().position(|table| {
                table
                    .dependencies()
                    .iter()
                    .all(|dep| sorted.iter().any(|resolved| resolved.name() == *dep))
            });

            match ready {
                Some(index) => sorted.push(pending.remove(index)),
                None => {
                    let names: Vec<_> = pending.iter().map(|table| table.name()).collect();
                    tracing::error!("unresolved table dependencies: {:?}", names);
                    sorted.append(&mut pending);
                }
            }
        }

        *tables = sorted;
    }

    pub fn table_names(&self) -> Vec<&'static str> {
        self.tables.iter().map(|table| table.name()).collect()
    }

    pub fn create_schema(&self) -> Vec<String> {
        self.tables.iter().map(|table| table.create()).collect()
    }

    pub fn dispose_schema(&self) -> Vec<String> {
        self.tables.iter().rev().map(|table| table.dispose()).collect()
    }
}

impl Default for SchemaManager {
    fn default() -> Self {
        SchemaManager::new(vec![
            Box::new(VoteTable),
            Box::new(FeedbackTable),
            Box::new(SensorSampleTable),
            Box::new(UserTable),
        ])
    }
}
