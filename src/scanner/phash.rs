use image::DynamicImage;
use image_hasher::{HashAlg, HasherConfig, ImageHash};

/// Perceptual hash of a frame, base64 form. Used only to skip recognition
/// on visually unchanged windows, never to decide eligibility.
pub fn compute_phash(image: &DynamicImage) -> String {
    let hasher = HasherConfig::new()
        .hash_alg(HashAlg::DoubleGradient)
        .hash_size(8, 8)
        .to_hasher();
    hasher.hash_image(image).to_base64()
}

pub fn hamming_distance(lhs: &str, rhs: &str) -> u32 {
    let Ok(h1) = ImageHash::<Vec<u8>>::from_base64(lhs) else {
        return u32::MAX;
    };
    let Ok(h2) = ImageHash::<Vec<u8>>::from_base64(rhs) else {
        return u32::MAX;
    };
    h1.dist(&h2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn identical_frames_hash_identically() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 64, Luma([100u8])));
        let a = compute_phash(&img);
        let b = compute_phash(&img);
        assert_eq!(a, b);
        assert_eq!(hamming_distance(&a, &b), 0);
    }

    #[test]
    fn unparseable_hashes_count_as_changed() {
        assert_eq!(hamming_distance("not-base64!", "also-not"), u32::MAX);
    }
}
