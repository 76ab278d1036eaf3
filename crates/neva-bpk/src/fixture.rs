//! In-memory archives for tests.

use crate::Layout;

pub(crate) struct FixtureFile {
    pub name: Vec<u8>,
    pub full_size: u32,
    pub stored_size: u32,
    pub data_address: u32,
}

impl FixtureFile {
    pub fn new(name: &[u8], full_size: u32, stored_size: u32, data_address: u32) -> Self {
        Self {
            name: name.to_vec(),
            full_size,
            stored_size,
            data_address,
        }
    }
}

pub(crate) struct FixtureFolder {
    pub name: Vec<u8>,
    pub files: Vec<FixtureFile>,
    pub file_table_address: Option<u32>,
}

impl FixtureFolder {
    pub fn new(name: &[u8], files: Vec<FixtureFile>) -> Self {
        Self {
            name: name.to_vec(),
            files,
            file_table_address: None,
        }
    }

    pub fn with_file_table_address(mut self, address: u32) -> Self {
        self.file_table_address = Some(address);
        self
    }
}

/// Builds a BPK0 archive: header, then every file table followed by its
/// names, then the folder table running to the end of the file.
pub(crate) struct ArchiveBuilder {
    data_start: usize,
    folders: Vec<FixtureFolder>,
}

impl ArchiveBuilder {
    pub fn new(data_start: usize) -> Self {
        assert!(data_start >= 12);
        Self {
            data_start,
            folders: Vec::new(),
        }
    }

    pub fn folder(mut self, folder: FixtureFolder) -> Self {
        self.folders.push(folder);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let layout = Layout::BPK0;
        let mut out = vec![0u8; self.data_start];
        out[..4].copy_from_slice(&layout.signature);

        let mut table_addresses = Vec::with_capacity(self.folders.len());
        for folder in &self.folders {
            let table = out.len();
            let names = table + folder.files.len() * layout.file_record_len as usize;

            for (i, file) in folder.files.iter().enumerate() {
                let record = table + i * layout.file_record_len as usize;
                let name = names + i * layout.file_name_len;
                push_u32(&mut out, (name - record) as u32);
                push_u32(&mut out, file.full_size);
                push_u32(&mut out, file.stored_size);
                push_u32(&mut out, file.data_address);
            }
            for file in &folder.files {
                let mut slot = vec![0u8; layout.file_name_len];
                slot[..file.name.len()].copy_from_slice(&file.name);
                out.extend_from_slice(&slot);
            }

            let address = match folder.file_table_address {
                Some(address) => address,
                None if folder.files.is_empty() => 0,
                None => table as u32,
            };
            table_addresses.push(address);
        }

        let folder_table = out.len() as u32;
        out[8..12].copy_from_slice(&folder_table.to_le_bytes());

        for (folder, address) in self.folders.iter().zip(table_addresses) {
            let length = layout.folder_prefix_len as usize + folder.name.len();
            push_u16(&mut out, 0);
            push_u16(&mut out, 0);
            push_u16(&mut out, length as u16);
            push_u16(&mut out, folder.files.len() as u16);
            push_u32(&mut out, address);
            push_u32(&mut out, 0);
            push_u32(&mut out, 0);
            out.extend_from_slice(&folder.name);
        }

        out
    }
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}
