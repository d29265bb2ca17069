pub mod seaorm;

pub use seaorm::SeaOrmStoreRepository;
