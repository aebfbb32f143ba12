#[cfg(test)]
mod storage_tests {
    use invoicegen_server::storage::{
        validate_object_key, MemoryStorage, ObjectStorage, StorageError, SupabaseConfig,
    };

    #[test]
    fn test_supabase_config_debug_format() {
        let config = SupabaseConfig {
            supabase_url: "https://test.supabase.co".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            bucket_name: "invoices-bucket".to_string(),
        };
        let debug_str = format!("{:?}", config);

        assert!(debug_str.contains("SupabaseConfig"));
        assert!(debug_str.contains("test.supabase.co"));
    }

    #[test]
    fn test_supabase_config_clone() {
        let config1 = SupabaseConfig {
            supabase_url: "https://test.supabase.co".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            bucket_name: "test-bucket".to_string(),
        };
        let config2 = config1.clone();

        assert_eq!(config1.supabase_url, config2.supabase_url);
        assert_eq!(config1.supabase_anon_key, config2.supabase_anon_key);
        assert_eq!(config1.bucket_name, config2.bucket_name);
    }

    #[test]
    fn test_valid_keys_pass_validation() {
        assert!(validate_object_key("invoices/abc.pdf").is_ok());
        assert!(validate_object_key("organization.json").is_ok());
    }

    #[test]
    fn test_malformed_keys_are_rejected() {
        for key in ["", "/invoices/abc.pdf", "invoices/", "invoices//abc.pdf", "../secrets", "invoices/../other"] {
            let result = validate_object_key(key);
            assert!(
                matches!(result, Err(StorageError::InvalidKey(_))),
                "key {:?} should be rejected",
                key
            );
        }
    }

    #[tokio::test]
    async fn test_memory_storage_upload_and_sign() {
        let storage = MemoryStorage::new();

        storage
            .upload_file("invoices/test.pdf", b"%PDF-1.5", "application/pdf")
            .await
            .expect("upload failed");

        assert!(storage.contains("invoices/test.pdf"));
        assert_eq!(storage.len(), 1);

        let url = storage
            .create_signed_url("invoices/test.pdf", 300)
            .await
            .expect("sign failed");
        assert!(url.contains("invoices/test.pdf"));
        assert!(url.contains("expires=300"));
    }

    #[tokio::test]
    async fn test_signing_does_not_verify_object_existence() {
        let storage = MemoryStorage::new();

        // A well-formed key signs even when nothing was uploaded under it
        let url = storage
            .create_signed_url("invoices/missing.pdf", 300)
            .await
            .expect("sign failed");
        assert!(url.contains("invoices/missing.pdf"));
    }

    #[tokio::test]
    async fn test_signing_rejects_malformed_key() {
        let storage = MemoryStorage::new();

        let result = storage.create_signed_url("../etc/passwd", 300).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }
}
