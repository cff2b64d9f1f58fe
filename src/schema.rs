diesel::table! {
    recipes (id) {
        id -> BigInt,
        title -> Text,
        image -> Text,
        used_ingredients -> Text,
        missed_ingredients -> Text,
        rating -> Nullable<Integer>,
    }
}
