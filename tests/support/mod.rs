#![allow(dead_code)]
pub mod builders;

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use umya_spreadsheet::Spreadsheet;

pub use builders::{InvoiceFixture, first_sheet, first_sheet_mut};

pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub struct TestWorkspace {
    _tempdir: TempDir,
    root: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let root = tempdir.path().to_path_buf();
        Self {
            _tempdir: tempdir,
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn create_workbook(&self, name: &str, f: impl FnOnce(&mut Spreadsheet)) -> PathBuf {
        let path = self.path(name);
        let mut book = umya_spreadsheet::new_file();
        f(&mut book);
        umya_spreadsheet::writer::xlsx::write(&book, &path).expect("write workbook");
        path
    }

    pub fn write_invoice(&self, name: &str, fixture: &InvoiceFixture) -> PathBuf {
        let path = self.path(name);
        umya_spreadsheet::writer::xlsx::write(&fixture.book(), &path).expect("write workbook");
        path
    }

    pub fn open(&self, path: &Path) -> Spreadsheet {
        umya_spreadsheet::reader::xlsx::read(path).expect("read workbook")
    }
}
