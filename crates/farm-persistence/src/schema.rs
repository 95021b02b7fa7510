// Diesel schema for the SQLite farm store (see migrations/).
// Tablas: ferme, animal, stock, alimentation, production
use diesel::allow_tables_to_appear_in_same_query;
diesel::table! {
    ferme (id) {
        id -> BigInt,
        nom -> Text,
        solde_ecus -> BigInt,
    }
}
diesel::table! {
    animal (id) {
        id -> BigInt,
        #[sql_name = "type"]
        type_ -> Text,
        poids -> Double,
        age -> Integer,
        sexe -> Nullable<Text>,
        ferme_id -> BigInt,
    }
}
diesel::table! {
    stock (id) {
        id -> BigInt,
        #[sql_name = "type"]
        type_ -> Text,
        quantite -> BigInt,
        ferme_id -> BigInt,
    }
}
diesel::table! {
    alimentation (id) {
        id -> BigInt,
        animal_id -> BigInt,
        date_nourrissage -> Date,
    }
}
diesel::table! {
    production (id) {
        id -> BigInt,
        #[sql_name = "type"]
        type_ -> Text,
        quantite -> BigInt,
        ferme_id -> BigInt,
    }
}
allow_tables_to_appear_in_same_query!(ferme, animal, stock, alimentation, production);
