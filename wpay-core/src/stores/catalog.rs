//! The fixed product catalog.

use compact_str::CompactString;
use lazy_static::lazy_static;
use rust_decimal::Decimal;
use wpay_sdk::objects::{PaymentAssetOption, Product};

fn product(
    id: &str,
    name: &str,
    description: &str,
    cents: i64,
    image: &str,
    category: &str,
    sizes: &[&str],
) -> Product {
    Product {
        id: id.into(),
        name: name.to_string(),
        description: description.to_string(),
        price: Decimal::new(cents, 2),
        image: image.to_string(),
        category: category.into(),
        sizes: sizes.iter().map(|s| CompactString::from(*s)).collect(),
    }
}

lazy_static! {
    static ref PRODUCTS: Vec<Product> = vec![
        product(
            "1",
            "Classic Cotton T-Shirt",
            "Comfortable, everyday cotton t-shirt with a perfect fit.",
            1000,
            "/products/tshirt-back.png",
            "tshirt",
            &["XS", "S", "M", "L", "XL", "XXL"],
        ),
        product(
            "2",
            "Premium Logo Cap",
            "Stylish cap featuring the store logo, perfect for any casual outfit.",
            599,
            "/products/cap-front.jpg",
            "cap",
            &["One Size"],
        ),
        product(
            "3",
            "Canvas Tote Bag",
            "Durable canvas tote bag perfect for everyday use.",
            120,
            "/products/tote.jpg",
            "tote",
            &["One Size"],
        ),
        product(
            "4",
            "Premium Logo T-Shirt",
            "High-quality premium t-shirt with store branding.",
            2999,
            "/products/premium-tshirt.png",
            "tshirt",
            &["XS", "S", "M", "L", "XL"],
        ),
    ];
}

pub fn products() -> &'static [Product] {
    &PRODUCTS
}

pub fn find_product(id: &str) -> Option<&'static Product> {
    PRODUCTS.iter().find(|p| p.id == id)
}

/// Payment asset presets offered to the buyer. Testnet presets are hidden
/// unless `include_testnet` is set.
pub fn asset_options(include_testnet: bool) -> Vec<PaymentAssetOption> {
    PaymentAssetOption::all()
        .into_iter()
        .filter(|o| include_testnet || !o.testnet)
        .collect()
}
