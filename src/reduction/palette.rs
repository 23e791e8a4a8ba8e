use super::*;

/// Drops unused and duplicate palette entries, and moves the entries with
/// any transparency to the front so the `tRNS` chunk can be shorter.
pub(crate) fn reduced_palette(image: &PngImage) -> Option<PngImage> {
  let palette = image.ihdr.color_type.palette()?;

  let mut used = [false; 256];
  scan_pixels(image, |s| used[usize::from(s[0])] = true);

  // Unique used colors, see-through ones first, otherwise in index order.
  let mut entries: Vec<RGBA8> = Vec::with_capacity(palette.len());
  for see_through in [true, false] {
    for (i, entry) in palette.iter().enumerate() {
      if used[i] && (entry.a != u8::MAX) == see_through && !entries.contains(entry) {
        entries.push(*entry);
      }
    }
  }
  if entries.is_empty() {
    return None;
  }

  let mut remap = [0_u16; 256];
  for (i, entry) in palette.iter().enumerate() {
    if let Some(new_index) = entries.iter().position(|e| e == entry) {
      remap[i] = new_index as u16;
    }
  }
  if entries.as_slice() == palette {
    return None;
  }

  let ihdr = with_format(&image.ihdr, ColorType::Indexed { palette: entries }, image.ihdr.bit_depth);
  Some(map_pixels(image, ihdr, |s, out| out[0] = remap[usize::from(s[0])]))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::reduction::tests::image_from_rgba;

  #[test]
  fn test_unused_and_duplicates_removed() {
    let palette = vec![
      RGBA8::new(1, 1, 1, 255),
      RGBA8::new(2, 2, 2, 255),
      RGBA8::new(1, 1, 1, 255),
      RGBA8::new(3, 3, 3, 255),
    ];
    let mut image = image_from_rgba(3, ColorType::Indexed { palette }, &[[1, 1, 1, 255], [3, 3, 3, 255], [1, 1, 1, 255]]);
    // point one pixel at the duplicate entry
    image.data[2] = 2;
    let r = reduced_palette(&image).unwrap();
    assert_eq!(r.ihdr.color_type.palette().unwrap(), &[RGBA8::new(1, 1, 1, 255), RGBA8::new(3, 3, 3, 255)]);
    assert_eq!(r.data, vec![0, 1, 0]);
    assert_eq!(r.to_rgba16(), image.to_rgba16());
  }

  #[test]
  fn test_transparent_entries_move_first() {
    let palette = vec![RGBA8::new(1, 1, 1, 255), RGBA8::new(0, 0, 0, 0)];
    let image = image_from_rgba(2, ColorType::Indexed { palette }, &[[1, 1, 1, 255], [0, 0, 0, 0]]);
    let r = reduced_palette(&image).unwrap();
    assert_eq!(r.ihdr.color_type.palette().unwrap()[0].a, 0);
    assert_eq!(r.data, vec![1, 0]);
    assert!(reduced_palette(&r).is_none());
  }
}
