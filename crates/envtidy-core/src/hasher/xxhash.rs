use std::fs::File;
use std::hash::Hasher as _;
use std::io::{self, BufReader, Read};
use std::path::Path;
use twox_hash::XxHash64;

const READ_CHUNK_LENGTH: usize = 64 * 1024; // 64KB

/// Stream a file through XxHash64 (seed 0). Returns `(byte_length, hash)`.
pub fn hash_file(file: &Path) -> io::Result<(u64, u64)> {
    let mut reader = BufReader::with_capacity(READ_CHUNK_LENGTH, File::open(file)?);
    let mut hasher = XxHash64::with_seed(0);
    let mut buffer = vec![0u8; READ_CHUNK_LENGTH];
    let mut total = 0u64;

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.write(&buffer[..bytes_read]);
        total += bytes_read as u64;
    }

    Ok((total, hasher.finish()))
}
