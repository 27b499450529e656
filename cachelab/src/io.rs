use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::error::TraceError;

// Lackey lines are rarely longer than 20 bytes, 4096 is the standard block size on most systems
const BUFFER_SIZE: usize = 16 * 4096;

/// Opens a trace file for reading, reporting a missing or unreadable file as
/// [`TraceError::Unavailable`]
pub fn open_trace<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>, TraceError> {
    let path = path.as_ref();
    let unavailable = |source| TraceError::Unavailable {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(unavailable)?;
    get_reader(file).map_err(unavailable)
}

pub fn get_reader(file: File) -> io::Result<Box<dyn BufRead>> {
    // Compatibility on other systems
    #[cfg(not(unix))]
    {
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)))
    }
    // Memory map regular files for speed on unix systems, pipes and devices can't be mapped
    #[cfg(unix)]
    {
        use std::io::Cursor;
        use memmap2::{Advice, Mmap};
        let metadata = file.metadata()?;
        if !metadata.is_file() {
            return Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)));
        }
        // Zero length mappings are rejected by some platforms
        if metadata.len() == 0 {
            return Ok(Box::new(io::empty()));
        }
        // The file is only read, and the map doesn't outlive the reader handed back
        unsafe {
            let m = Mmap::map(&file)?;
            m.advise(Advice::Sequential)?;
            Ok(Box::new(Cursor::new(m)))
        }
    }
}
