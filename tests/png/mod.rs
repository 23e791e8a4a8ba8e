use pngslim::png::{RawChunkIter, PNG_SIGNATURE};
use pngslim::{ErrorKind, PngData};

#[test]
fn test_RawChunkIter_no_panics() {
  // a real file, then every truncation of it
  let v = super::sample_png();
  assert!(RawChunkIter::new(&v).all(|c| c.is_ok()));
  for end in 0..v.len() {
    for _ in RawChunkIter::new(&v[..end]) {
      //
    }
  }
  // even totally random data should never panic the iterator!
  for _ in 0..10 {
    let v = super::rand_bytes(1024);
    for _ in RawChunkIter::new(&v) {
      //
    }
  }
}

#[test]
fn test_PngData_no_panics() {
  for _ in 0..10 {
    let mut v = PNG_SIGNATURE.to_vec();
    v.extend(super::rand_bytes(1024));
    assert_eq!(PngData::from_slice(&v, true).unwrap_err().kind(), ErrorKind::Format);
  }
  let good = super::sample_png();
  for _ in 0..20 {
    let mut v = good.clone();
    let noise = super::rand_bytes(3);
    // past the IHDR, so the image never claims to be huge
    let at = 33 + usize::from(noise[0]) * usize::from(noise[1]) % (v.len() - 33);
    v[at] ^= noise[2] | 1;
    // damage either fails cleanly or still decodes
    let _ = PngData::from_slice(&v, false);
    let _ = PngData::from_slice(&v, true);
  }
}
