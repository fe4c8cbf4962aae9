//! Concrete resource kinds

pub mod cart_discount;
pub mod category;
pub mod inventory;
pub mod product;

pub use cart_discount::{
    CartDiscount, CartDiscountDraft, CartDiscountTarget, CartDiscountValue, CartDiscounts,
    StackingMode,
};
pub use category::{Categories, Category, CategoryDraft};
pub use inventory::{Inventories, InventoryEntry, InventoryEntryDraft};
pub use product::{Product, ProductDraft, Products, Variant, VariantDraft};
